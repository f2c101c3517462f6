// --- FILE: superprompt-lib/src/lib.rs ---

#![doc = include_str!("../README.md")]

// Declare modules
mod config;
mod errors;
mod listing;
mod processing;
mod tree;
mod utils;

// Public API
pub use config::{
    normalize_extension, normalize_ignore_dir, EmptyDirPolicy, PromptRequest, ScanConfig,
    DEFAULT_ABORT_THRESHOLD, DEFAULT_IGNORE_DIRS, DEFAULT_MAX_DEPTH,
};
pub use errors::{CoreError, CoreResult};
pub use processing::{build_super_prompt, build_super_prompt_with, super_prompt_text, PromptResult};
pub use tree::{
    build_tree, build_tree_from, file_values, render_tree, validate_root, NodeKind, TreeNode,
};
pub use utils::{decode_text, read_file_safely, FileSource, OsFiles};
