//! sdf: file lifecycle and commit protocol for structured tensor data files.
//!
//! A data file persists numerical objects (tensors, matrix-product-state
//! representations) under one of three durability/concurrency policies. This
//! crate owns the lifecycle around those files: a [`DataFileSession`] selects
//! the physical filename for the requested [`Mode`], hands the caller a stable
//! path to write or read through, and on close brings the file to a
//! consistent, policy-correct end state.
//!
//! - [`Mode::Overwrite`] writes the logical path directly, clearing any
//!   previous file up front.
//! - [`Mode::Shared`] serializes access across processes with an advisory
//!   lock on a `.lck` sidecar file.
//! - [`Mode::Paranoid`] stages writes under a `.tmp` name and atomically
//!   renames over the logical path on close, so readers only ever observe a
//!   complete file.
//!
//! The binary encoding of payloads is not handled here; a codec collaborator
//! writes through [`DataFileSession::path`] once the session is open. The
//! [`format`] module carries the small protocol surface such codecs share
//! (payload type tags and byte order).

pub mod error;
pub mod format;
pub mod fs;
pub mod locks;
pub mod session;

pub use error::{Result, SdfError};
pub use format::{Endianness, PayloadKind};
pub use session::{DataFileSession, Mode};
