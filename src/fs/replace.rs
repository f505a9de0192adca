//! Atomic file replacement.
//!
//! The paranoid commit stages writes under a temporary name and then calls
//! [`replace_file`] to move the staged file over the logical path. The move
//! is a single `rename(2)`, atomic when source and destination share a
//! volume, so a concurrent reader of the destination only ever observes the
//! old complete file or the new complete file.

use crate::error::{Result, SdfError};
use crate::fs::{delete_file, file_exists};
use std::fs::{self, File};
use std::path::Path;

/// Atomically replace `destination` with `source`.
///
/// - An existing destination is deleted first; failure to delete it is
///   reported as [`SdfError::DeleteFailed`] rather than leaving an ambiguous
///   pair of files behind.
/// - The source must exist; its absence is a sequencing error reported as
///   [`SdfError::MissingSource`].
/// - The move itself is a single rename. After it succeeds the parent
///   directory is synced so the directory entry survives a crash.
pub fn replace_file<P: AsRef<Path>, Q: AsRef<Path>>(source: P, destination: Q) -> Result<()> {
    let source = source.as_ref();
    let destination = destination.as_ref();

    if file_exists(destination) {
        delete_file(destination)?;
    }

    if !file_exists(source) {
        return Err(SdfError::MissingSource {
            path: source.to_path_buf(),
        });
    }

    fs::rename(source, destination).map_err(|e| SdfError::Io {
        context: format!(
            "failed to rename '{}' to '{}'",
            source.display(),
            destination.display()
        ),
        source: e,
    })?;

    // Persist the directory entry as well; sync failures are not fatal.
    if let Some(parent) = destination.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }

    Ok(())
}
