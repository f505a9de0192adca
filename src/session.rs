//! Data file sessions.
//!
//! A [`DataFileSession`] represents one open logical data file. Construction
//! picks the physical filename for the requested [`Mode`] and performs that
//! mode's setup (clearing a previous artifact, or taking the shared lock);
//! closing performs the mode's commit action. The session is a scoped
//! resource: a session that leaves scope still open runs its close path
//! exactly once, so neither the shared lock nor a staged paranoid commit is
//! ever leaked.
//!
//! Payload encoding is not handled here. A codec collaborator writes or
//! reads through [`DataFileSession::path`] while the session is open; the
//! session only guarantees that path is ready and stable until close.

use crate::error::{Result, SdfError};
use crate::format::Endianness;
use crate::fs;
use crate::locks::{self, LockToken};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Suffix of the paranoid staging file.
const TMP_SUFFIX: &str = ".tmp";

/// Suffix of the shared-mode lock sidecar.
const LOCK_SUFFIX: &str = ".lck";

/// Durability/concurrency policy of a session, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Write the logical path directly; any previous file is deleted when
    /// the session opens.
    Overwrite,
    /// Write the logical path directly, serialized across processes by an
    /// advisory lock; construction blocks until the lock is held.
    Shared,
    /// Stage writes under `<logical>.tmp` and atomically rename over the
    /// logical path on close. Readers of the logical path only ever see the
    /// old complete file or the new complete file. Mutual exclusion among
    /// paranoid writers is the caller's responsibility.
    Paranoid,
}

impl Mode {
    /// The mode's config-facing name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Overwrite => "overwrite",
            Mode::Shared => "shared",
            Mode::Paranoid => "paranoid",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = SdfError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "overwrite" => Ok(Mode::Overwrite),
            "shared" => Ok(Mode::Shared),
            "paranoid" => Ok(Mode::Paranoid),
            other => Err(SdfError::InvalidMode(other.to_string())),
        }
    }
}

/// Conversion from the legacy integer flag values stored by older tools.
impl TryFrom<u8> for Mode {
    type Error = SdfError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Mode::Overwrite),
            1 => Ok(Mode::Shared),
            2 => Ok(Mode::Paranoid),
            other => Err(SdfError::InvalidMode(other.to_string())),
        }
    }
}

/// One open logical data file.
///
/// The physical path written through is a pure function of the mode and
/// never changes after construction: it equals the logical path except in
/// paranoid mode, where writes are staged under `<logical>.tmp`.
#[derive(Debug)]
pub struct DataFileSession {
    /// Caller-visible identity of the data file.
    logical_path: PathBuf,

    /// Path actually written to for the duration of the session.
    physical_path: PathBuf,

    mode: Mode,

    /// Held for the whole open interval in shared mode; absent otherwise.
    lock: Option<LockToken>,

    open: bool,
}

impl DataFileSession {
    /// Open a logical data file under the given mode.
    ///
    /// - `Overwrite`: clears any previous file at the logical path, plus a
    ///   stale staging file left by a crashed paranoid writer.
    /// - `Shared`: blocks until the advisory lock on `<logical>.lck` is
    ///   held. Nothing is deleted.
    /// - `Paranoid`: clears a stale staging file, then stages new writes
    ///   under `<logical>.tmp`.
    ///
    /// A file that must be cleared but cannot be deleted fails the open with
    /// [`SdfError::DeleteFailed`]; continuing would risk writing alongside
    /// stale data.
    pub fn open<P: AsRef<Path>>(logical_path: P, mode: Mode) -> Result<Self> {
        let logical_path = logical_path.as_ref().to_path_buf();
        let temp_path = append_suffix(&logical_path, TMP_SUFFIX);

        let (physical_path, lock) = match mode {
            Mode::Overwrite => {
                fs::delete_if_exists(&logical_path)?;
                fs::delete_if_exists(&temp_path)?;
                (logical_path.clone(), None)
            }
            Mode::Shared => {
                let lock_path = append_suffix(&logical_path, LOCK_SUFFIX);
                let token = locks::acquire(&lock_path, true)?;
                (logical_path.clone(), Some(token))
            }
            Mode::Paranoid => {
                fs::delete_if_exists(&temp_path)?;
                (temp_path, None)
            }
        };

        Ok(Self {
            logical_path,
            physical_path,
            mode,
            lock,
            open: true,
        })
    }

    /// The path the payload codec writes or reads through.
    pub fn path(&self) -> &Path {
        &self.physical_path
    }

    /// The caller-visible identity of the data file.
    pub fn logical_path(&self) -> &Path {
        &self.logical_path
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Byte order a codec should use for this file's numeric payloads.
    pub fn endianness(&self) -> Endianness {
        Endianness::native()
    }

    /// Close the session, performing the mode's commit action.
    ///
    /// - `Shared`: releases the advisory lock and deletes the sidecar.
    /// - `Paranoid`: if anything was staged, atomically replaces the logical
    ///   path with the staged file; with nothing staged the logical file is
    ///   left untouched.
    /// - `Overwrite`: the file at the logical path is already the final
    ///   artifact; nothing to do.
    ///
    /// Idempotent: a second call is a no-op. A session dropped while still
    /// open runs the same path, logging instead of returning errors.
    pub fn close(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;

        match self.mode {
            Mode::Shared => {
                if let Some(token) = self.lock.take() {
                    token.release()?;
                }
            }
            Mode::Paranoid => {
                if fs::file_exists(&self.physical_path) {
                    fs::replace_file(&self.physical_path, &self.logical_path)?;
                }
            }
            Mode::Overwrite => {}
        }
        Ok(())
    }
}

impl Drop for DataFileSession {
    fn drop(&mut self) {
        if self.open
            && let Err(e) = self.close()
        {
            tracing::warn!(
                "failed to close data file '{}': {}",
                self.logical_path.display(),
                e
            );
        }
    }
}

/// Append a suffix to a path without touching its extension, so
/// `data.sdf` becomes `data.sdf.tmp` rather than `data.tmp`.
fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}
