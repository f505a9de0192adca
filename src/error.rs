//! Error types for sdf.
//!
//! Uses thiserror for derive macros. Conditions the original file format
//! handled by aborting the process (undeletable stale files, missing rename
//! sources, unrecognized modes) are surfaced as typed variants instead, so
//! the embedding application decides whether to terminate.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for sdf operations.
#[derive(Error, Debug)]
pub enum SdfError {
    /// Non-blocking lock acquisition failed and the caller declined to wait.
    ///
    /// `holder` carries the owner diagnostic read from the lock sidecar, when
    /// it could be parsed.
    #[error("lock '{}' is held by another process{}", path.display(), holder.as_deref().map(|h| format!(" ({h})")).unwrap_or_default())]
    LockUnavailable {
        path: PathBuf,
        holder: Option<String>,
    },

    /// A file that must be cleared before proceeding could not be deleted
    /// (stale temp file, overwrite target, atomic-replace destination).
    #[error("failed to delete '{}': {source}", path.display())]
    DeleteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The source of an atomic replace does not exist. This indicates a
    /// sequencing error in the caller, not an expected runtime condition.
    #[error("replace source '{}' does not exist", path.display())]
    MissingSource { path: PathBuf },

    /// A mode name or flag value did not match any known session mode.
    #[error("unrecognized data file mode '{0}'")]
    InvalidMode(String),

    /// A payload type tag outside the known range was read from a file.
    #[error("not a valid payload tag code: {0}")]
    InvalidTag(usize),

    /// Any other local filesystem failure.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

/// Result type alias for sdf operations.
pub type Result<T> = std::result::Result<T, SdfError>;
