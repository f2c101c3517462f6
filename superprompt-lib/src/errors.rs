// --- FILE: superprompt-lib/src/errors.rs ---

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur inside the `superprompt` library.
///
/// None of these cross the two core operations ([`crate::build_tree`] and
/// [`crate::build_super_prompt`]); those degrade to an empty tree or a
/// placeholder instead. The errors surface from the boundary constructors
/// ([`crate::ScanConfig::from_raw`], [`crate::PromptRequest::from_raw`]) and
/// from [`crate::validate_root`].
#[derive(Error, Debug)]
pub enum CoreError {
    /// The root path does not exist or is not a directory.
    #[error("Root path not found or not a directory: {0}")]
    InvalidRoot(PathBuf),

    /// A negative maximum depth was supplied.
    #[error("Tree max depth must be zero or greater, got {0}")]
    InvalidDepth(i64),

    /// The abort threshold must allow at least one file.
    #[error("Abort threshold must be at least 1, got {0}")]
    InvalidThreshold(i64),

    /// An I/O error occurred while accessing a path.
    #[error("IO error accessing path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The directory walker failed on a path.
    #[error("Failed to list directory '{path}': {source}")]
    WalkError {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

impl CoreError {
    /// Whether this error only affects the branch being listed.
    ///
    /// Permission and not-found failures below the root are recovered by
    /// dropping that branch; anything else aborts the scan.
    pub(crate) fn is_branch_local(&self) -> bool {
        let kind = match self {
            CoreError::IoError { source, .. } => Some(source.kind()),
            CoreError::WalkError { source, .. } => source.io_error().map(io::Error::kind),
            _ => None,
        };
        matches!(
            kind,
            Some(io::ErrorKind::PermissionDenied) | Some(io::ErrorKind::NotFound)
        )
    }
}

/// A convenience type alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;
