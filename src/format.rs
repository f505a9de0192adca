//! On-disk protocol surface shared with payload codecs.
//!
//! The lifecycle layer does not encode tensor contents itself, but codecs
//! reading or writing through an open session agree on two small pieces of
//! protocol: the type tag stored alongside each payload, and the byte order
//! of the file. Both live here.

use crate::error::{Result, SdfError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of the fixed-size record-name field in the on-disk format.
pub const VAR_NAME_SIZE: usize = 64;

/// The four payload types a data file can store.
///
/// Tags are assigned in declaration order (0..=3) and are stable on disk.
/// Any other tag value read from a file is rejected before lookup via
/// [`PayloadKind::from_tag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadKind {
    /// Real-valued tensor.
    RealTensor,
    /// Complex-valued tensor.
    ComplexTensor,
    /// Real matrix-product state.
    RealMps,
    /// Complex matrix-product state.
    ComplexMps,
}

impl PayloadKind {
    /// Resolve a type tag read from a file.
    ///
    /// Tags outside `0..=3` yield [`SdfError::InvalidTag`].
    pub fn from_tag(tag: usize) -> Result<Self> {
        match tag {
            0 => Ok(PayloadKind::RealTensor),
            1 => Ok(PayloadKind::ComplexTensor),
            2 => Ok(PayloadKind::RealMps),
            3 => Ok(PayloadKind::ComplexMps),
            other => Err(SdfError::InvalidTag(other)),
        }
    }

    /// The tag stored on disk for this payload type.
    pub fn tag(&self) -> usize {
        match self {
            PayloadKind::RealTensor => 0,
            PayloadKind::ComplexTensor => 1,
            PayloadKind::RealMps => 2,
            PayloadKind::ComplexMps => 3,
        }
    }

    /// Human-readable type label used in diagnostics and validation.
    pub fn name(&self) -> &'static str {
        match self {
            PayloadKind::RealTensor => "RTensor",
            PayloadKind::ComplexTensor => "CTensor",
            PayloadKind::RealMps => "Real MPS",
            PayloadKind::ComplexMps => "Complex MPS",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Byte order of a data file's numeric payloads.
///
/// Resolved once from the target platform and threaded explicitly into
/// whatever codec needs it, rather than read from a global.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    /// The byte order of the platform this crate was compiled for.
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_map_to_expected_names() {
        let expected = ["RTensor", "CTensor", "Real MPS", "Complex MPS"];
        for (tag, name) in expected.iter().enumerate() {
            let kind = PayloadKind::from_tag(tag).unwrap();
            assert_eq!(kind.name(), *name);
            assert_eq!(kind.tag(), tag);
        }
    }

    #[test]
    fn out_of_range_tags_are_rejected() {
        for tag in [4usize, 5, 100, usize::MAX] {
            let err = PayloadKind::from_tag(tag).unwrap_err();
            assert!(matches!(err, SdfError::InvalidTag(t) if t == tag));
        }
    }

    #[test]
    fn display_matches_name() {
        assert_eq!(PayloadKind::RealMps.to_string(), "Real MPS");
    }

    #[test]
    fn native_endianness_matches_target() {
        let expected = if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        };
        assert_eq!(Endianness::native(), expected);
    }
}
