// --- FILE: superprompt-lib/src/config.rs ---

use std::collections::BTreeSet;
use std::path::PathBuf;

use log::debug;

use crate::errors::{CoreError, CoreResult};

/// Default maximum depth of the tree view.
pub const DEFAULT_MAX_DEPTH: usize = 2;

/// Default number of selected files above which assembly is refused.
pub const DEFAULT_ABORT_THRESHOLD: usize = 50;

/// Directory names hidden from the tree unless configured otherwise.
pub const DEFAULT_IGNORE_DIRS: &[&str] = &["assets", "secret"];

/// What to do with directories that end up with no children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyDirPolicy {
    /// Keep an empty directory as long as it sits above the depth boundary,
    /// so a caller can still offer it for expansion. Empty directories at the
    /// boundary itself are dropped.
    #[default]
    KeepWithinDepth,
    /// Only emit directories that have at least one child.
    Omit,
}

/// Settings for a single tree scan.
///
/// Built fresh for every scan request and discarded afterwards.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Directory whose contents are listed. Node values are relative to it.
    pub root_path: PathBuf,

    /// Deepest level that is still expanded. Depth 0 is the root's own
    /// entries, so no node value ever has more than `max_depth + 1` segments.
    pub max_depth: usize,

    /// Directory names to hide. A directory is hidden, with everything under
    /// it, when any segment of its relative path equals one of these.
    pub ignore_dirs: BTreeSet<String>,

    /// File extensions (without the leading dot) to hide. Compared as-is.
    pub ignore_exts: BTreeSet<String>,

    /// Handling of directories left without children.
    pub empty_dirs: EmptyDirPolicy,
}

impl ScanConfig {
    /// Creates a config with no ignore rules and the default empty-dir policy.
    pub fn new(root_path: impl Into<PathBuf>, max_depth: usize) -> Self {
        Self {
            root_path: root_path.into(),
            max_depth,
            ignore_dirs: BTreeSet::new(),
            ignore_exts: BTreeSet::new(),
            empty_dirs: EmptyDirPolicy::default(),
        }
    }

    /// Builds a config from loosely typed input, such as values coming from a
    /// form field or a config file.
    ///
    /// Negative depths are rejected. Ignore entries are normalised with
    /// [`normalize_ignore_dir`] and [`normalize_extension`]; entries that are
    /// empty after normalisation are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDepth`] when `max_depth` is negative.
    pub fn from_raw<D, E>(
        root_path: impl Into<PathBuf>,
        max_depth: i64,
        ignore_dirs: D,
        ignore_exts: E,
    ) -> CoreResult<Self>
    where
        D: IntoIterator,
        D::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let depth = usize::try_from(max_depth).map_err(|_| CoreError::InvalidDepth(max_depth))?;
        let config = Self::new(root_path, depth)
            .with_ignore_dirs(ignore_dirs)
            .with_ignore_exts(ignore_exts);
        debug!("Built scan config from raw input: {:?}", config);
        Ok(config)
    }

    /// Adds directory names to ignore.
    pub fn with_ignore_dirs<I>(mut self, dirs: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.ignore_dirs.extend(
            dirs.into_iter()
                .filter_map(|d| normalize_ignore_dir(d.as_ref())),
        );
        self
    }

    /// Adds file extensions to ignore.
    pub fn with_ignore_exts<I>(mut self, exts: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.ignore_exts.extend(
            exts.into_iter()
                .filter_map(|e| normalize_extension(e.as_ref())),
        );
        self
    }

    pub fn with_empty_dirs(mut self, policy: EmptyDirPolicy) -> Self {
        self.empty_dirs = policy;
        self
    }
}

/// Inputs for one prompt assembly.
#[derive(Debug, Clone)]
pub struct PromptRequest {
    /// Paths relative to `root_path`, in the order they should appear.
    pub selected_files: Vec<String>,

    /// Directory the selected paths are resolved against.
    pub root_path: PathBuf,

    /// Instruction placed before the file blocks. Empty means none.
    pub user_prompt: String,

    /// Maximum number of selected entries. [`PromptRequest::new`] and
    /// [`PromptRequest::from_raw`] only accept 1 or more.
    pub abort_threshold: usize,
}

impl PromptRequest {
    pub fn new(
        selected_files: Vec<String>,
        root_path: impl Into<PathBuf>,
        user_prompt: impl Into<String>,
        abort_threshold: usize,
    ) -> CoreResult<Self> {
        if abort_threshold == 0 {
            return Err(CoreError::InvalidThreshold(0));
        }
        Ok(Self {
            selected_files,
            root_path: root_path.into(),
            user_prompt: user_prompt.into(),
            abort_threshold,
        })
    }

    /// Builds a request from loosely typed input.
    ///
    /// A missing prompt is treated as empty. Selected entries that are blank
    /// are dropped; the rest keep their order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidThreshold`] when `abort_threshold < 1`.
    pub fn from_raw<I>(
        selected_files: I,
        root_path: impl Into<PathBuf>,
        user_prompt: Option<&str>,
        abort_threshold: i64,
    ) -> CoreResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let threshold = usize::try_from(abort_threshold)
            .ok()
            .filter(|t| *t > 0)
            .ok_or(CoreError::InvalidThreshold(abort_threshold))?;
        let selected = selected_files
            .into_iter()
            .map(Into::into)
            .filter(|s: &String| !s.trim().is_empty())
            .collect();
        Self::new(selected, root_path, user_prompt.unwrap_or_default(), threshold)
    }
}

/// Normalises a directory ignore entry: trims whitespace and surrounding
/// slashes. Returns `None` if nothing is left.
pub fn normalize_ignore_dir(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches(|c| c == '/' || c == '\\');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Normalises an extension ignore entry: trims whitespace and a leading
/// `*.` or `.`. Returns `None` if nothing is left.
pub fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('*').unwrap_or(trimmed);
    let trimmed = trimmed.strip_prefix('.').unwrap_or(trimmed).trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
