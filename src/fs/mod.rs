//! Filesystem primitives for sdf.
//!
//! Thin helpers over `std::fs` that map failures onto the crate's error
//! taxonomy. The atomic replace used by the paranoid commit lives in
//! [`replace`].

mod replace;

pub use replace::replace_file;

use crate::error::{Result, SdfError};
use std::fs;
use std::path::Path;

/// Check whether a file exists at `path`.
pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
    fs::metadata(path.as_ref()).is_ok()
}

/// Delete the file at `path`.
///
/// Callers are expected to have checked existence first; deleting a missing
/// file is reported as [`SdfError::DeleteFailed`] like any other failure.
pub fn delete_file<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    fs::remove_file(path).map_err(|e| SdfError::DeleteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Delete the file at `path` if it exists.
///
/// Used to clear a previous artifact (overwrite target, stale temp file)
/// before a session starts writing.
pub fn delete_if_exists<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if file_exists(path) {
        delete_file(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_exists_reflects_filesystem_state() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("probe.sdf");

        assert!(!file_exists(&path));
        fs::write(&path, b"x").unwrap();
        assert!(file_exists(&path));
    }

    #[test]
    fn delete_file_removes_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("victim.sdf");
        fs::write(&path, b"x").unwrap();

        delete_file(&path).unwrap();
        assert!(!file_exists(&path));
    }

    #[test]
    fn delete_file_on_missing_path_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.sdf");

        let err = delete_file(&path).unwrap_err();
        assert!(matches!(err, SdfError::DeleteFailed { path: p, .. } if p == path));
    }

    #[test]
    fn delete_if_exists_tolerates_missing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("maybe.sdf");

        delete_if_exists(&path).unwrap();

        fs::write(&path, b"x").unwrap();
        delete_if_exists(&path).unwrap();
        assert!(!file_exists(&path));
    }
}
