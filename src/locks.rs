//! Advisory locking for shared-mode sessions.
//!
//! A shared-mode session serializes access to its data file across processes
//! with an exclusive advisory lock on a `.lck` sidecar file. The sidecar is
//! created with world-writable permissions so cooperating processes running
//! as different users can take their turn, and it carries JSON metadata
//! (owner, pid, timestamp) so a contending process can report who is holding
//! it up.
//!
//! # Degrade policy
//!
//! Some filesystems (certain network mounts) do not support advisory locks.
//! Acquisition on such a filesystem succeeds anyway, with a warning that
//! locking is disabled. This is a deliberate degrade-to-unsafe policy for
//! callers who know their deployment, not an error.
//!
//! # Release ordering
//!
//! Release unlinks the lock file *before* closing the descriptor. A waiter
//! that already opened the same inode reopens the path on its next retry, so
//! it always ends up locking the freshly created file rather than an orphaned
//! inode a new creator has since replaced.

use crate::error::{Result, SdfError};
use chrono::{DateTime, Duration, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;

/// Interval between retries while waiting for a contended lock.
const RETRY_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);

/// Metadata written into the lock sidecar file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockMetadata {
    /// Owner of the lock (e.g., `user@HOST`).
    pub owner: String,

    /// Process ID of the lock holder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,

    /// Timestamp when the lock was taken (RFC3339).
    pub created_at: DateTime<Utc>,
}

impl LockMetadata {
    /// Create new lock metadata with the current timestamp.
    pub fn new() -> Self {
        Self {
            owner: get_owner_string(),
            pid: Some(std::process::id()),
            created_at: Utc::now(),
        }
    }

    /// Parse lock metadata from a sidecar file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| SdfError::Io {
            context: format!("failed to read lock file '{}'", path.display()),
            source: e,
        })?;

        serde_json::from_str(&content).map_err(|e| SdfError::Io {
            context: format!("failed to parse lock file '{}'", path.display()),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })
    }

    /// Serialize lock metadata to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SdfError::Io {
            context: "failed to serialize lock metadata".to_string(),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })
    }

    /// Age of the lock.
    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.created_at)
    }

    /// Format the age as a human-readable string.
    pub fn age_string(&self) -> String {
        let age = self.age();
        let minutes = age.num_minutes();
        let hours = age.num_hours();
        let days = age.num_days();

        if days > 0 {
            format!("{}d {}h", days, hours % 24)
        } else if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else {
            format!("{}m", minutes)
        }
    }
}

impl Default for LockMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// Get the owner string for lock metadata.
fn get_owner_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Ownership of one acquired lock.
///
/// The token holds the locked descriptor open for its whole lifetime. It is
/// a scoped resource: dropping an unreleased token performs the release, and
/// a failure to do so is logged rather than panicking.
#[derive(Debug)]
pub struct LockToken {
    /// The open lock file; closing it drops the OS lock.
    file: Option<File>,

    /// Path of the lock sidecar, unlinked on release.
    path: PathBuf,

    /// False when the filesystem did not support locking and acquisition
    /// degraded to an unlocked token.
    os_locked: bool,

    /// Whether the token has been released.
    released: bool,
}

impl LockToken {
    /// Path of the lock sidecar file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether an OS-level lock is actually held, or acquisition degraded on
    /// a filesystem without lock support.
    pub fn holds_os_lock(&self) -> bool {
        self.os_locked
    }

    /// Release the lock, deleting the sidecar file.
    ///
    /// Dropping the token does the same; the explicit form surfaces errors.
    pub fn release(mut self) -> Result<()> {
        self.release_inner()
    }

    fn release_inner(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        // Unlink first, then close. A concurrent waiter reopens the path on
        // its next retry, so it can never end up locking an inode that a new
        // creator has already replaced.
        fs::remove_file(&self.path).map_err(|e| SdfError::DeleteFailed {
            path: self.path.clone(),
            source: e,
        })?;
        self.file = None;
        Ok(())
    }
}

impl Drop for LockToken {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = self.release_inner()
        {
            tracing::warn!("failed to release lock '{}': {}", self.path.display(), e);
        }
    }
}

/// Acquire an exclusive advisory lock on `lock_path`.
///
/// The lock file is created if absent. With `wait` set, contention is
/// retried at a fixed one-second interval with no timeout and no fairness
/// guarantee; the caller cannot bound the wait. With `wait` unset, a
/// contended lock yields [`SdfError::LockUnavailable`] immediately, carrying
/// the holder's identity when the sidecar metadata could be read.
pub fn acquire<P: AsRef<Path>>(lock_path: P, wait: bool) -> Result<LockToken> {
    let lock_path = lock_path.as_ref();

    loop {
        // Reopened every attempt: the previous holder unlinks the file on
        // release, so a retry must pick up the freshly created inode.
        let file = open_lock_file(lock_path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                write_metadata(&file, lock_path);
                return Ok(LockToken {
                    file: Some(file),
                    path: lock_path.to_path_buf(),
                    os_locked: true,
                    released: false,
                });
            }
            Err(e) if is_lock_unsupported(&e) => {
                tracing::warn!(
                    "filesystem does not support locking '{}'; proceeding without a lock",
                    lock_path.display()
                );
                return Ok(LockToken {
                    file: Some(file),
                    path: lock_path.to_path_buf(),
                    os_locked: false,
                    released: false,
                });
            }
            Err(_) if wait => {
                drop(file);
                thread::sleep(RETRY_INTERVAL);
            }
            Err(_) => {
                let holder = LockMetadata::from_file(lock_path)
                    .ok()
                    .map(|m| format!("{}, age {}", m.owner, m.age_string()));
                return Err(SdfError::LockUnavailable {
                    path: lock_path.to_path_buf(),
                    holder,
                });
            }
        }
    }
}

/// Open (creating if needed) the lock sidecar file.
///
/// Creation must not depend on the caller's umask: permissions are
/// re-applied after the open so every cooperating process can take the lock.
fn open_lock_file(path: &Path) -> Result<File> {
    let mut opts = OpenOptions::new();
    opts.read(true).write(true).create(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o666);
    }

    let file = opts.open(path).map_err(|e| SdfError::Io {
        context: format!("failed to open lock file '{}'", path.display()),
        source: e,
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o666));
    }

    Ok(file)
}

/// Record the holder in the sidecar so contending processes can name it.
/// Diagnostics only; failures are logged, never fail the acquisition.
fn write_metadata(mut file: &File, path: &Path) {
    let result = LockMetadata::new().to_json().and_then(|json| {
        file.set_len(0)
            .and_then(|_| file.write_all(json.as_bytes()))
            .and_then(|_| file.sync_all())
            .map_err(|e| SdfError::Io {
                context: format!("failed to write lock metadata to '{}'", path.display()),
                source: e,
            })
    });

    if let Err(e) = result {
        tracing::warn!("{}", e);
    }
}

fn is_lock_unsupported(err: &io::Error) -> bool {
    // 95 is EOPNOTSUPP on Linux.
    err.kind() == io::ErrorKind::Unsupported || err.raw_os_error() == Some(95)
}
