//! PackStream serialization format.
//!
//! PackStream is the binary value encoding carried inside Bolt messages.
//!
//! # Value model
//!
//! - **Null**, **Boolean**
//! - **Integer**: encoded in the smallest of tiny/8/16/32/64-bit forms,
//!   always decoded as `i64`
//! - **Float**: 64-bit IEEE 754
//! - **String**: UTF-8, **Bytes**: raw
//! - **List**, **Map** (string keys): length-prefixed, or streamed with an
//!   end-of-stream terminator
//! - **Structure**: a tag byte plus ordered fields
//!
//! Multi-byte numerics are written and read through [`crate::bolt::endian`].
//!
//! # Structure tags
//!
//! Which tags are legal depends on the negotiated protocol version. A
//! decoder built with [`PackStreamDecoder::with_registry`] rejects any tag
//! the registry does not know with [`PackStreamError::StructTagMismatch`].

pub mod decoder;
pub mod encoder;
pub mod marker;
pub mod structures;
pub mod types;

pub use decoder::{decode, PackStreamDecoder};
pub use encoder::{encode, PackStreamEncoder};
pub use structures::{
    PackStreamDate, PackStreamDateTime, PackStreamDuration, PackStreamLocalDateTime,
    PackStreamLocalTime, PackStreamNode, PackStreamPath, PackStreamPoint,
    PackStreamRelationship, PackStreamTime, PackStreamUnboundRelationship, TimeZone,
};
pub use types::{Metadata, PackStreamStructure, PackStreamValue};

use std::fmt;

/// PackStream errors.
///
/// All of these leave the input stream at an undefined position; the
/// connection that produced the bytes must not be reused.
#[derive(Debug, Clone, PartialEq)]
pub enum PackStreamError {
    /// Input ended before the value the marker announced was complete
    UnexpectedEndOfStream,
    /// Unknown marker, bad map key, or a structure of the wrong shape
    MalformedStream(String),
    /// Structure tag not registered for the active protocol version
    StructTagMismatch {
        /// Offending tag
        tag: u8,
    },
    /// String payload that is not valid UTF-8, or too long to encode
    InvalidEncoding(String),
    /// Collection too large for any size class
    ValueTooLarge(&'static str, usize),
    /// A structure that does not match the typed value it was read as
    InvalidStructure(String),
}

impl fmt::Display for PackStreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackStreamError::UnexpectedEndOfStream => write!(f, "Unexpected end of PackStream data"),
            PackStreamError::MalformedStream(msg) => write!(f, "Malformed PackStream data: {}", msg),
            PackStreamError::StructTagMismatch { tag } => {
                write!(f, "Structure tag 0x{:02X} is not valid for this protocol version", tag)
            }
            PackStreamError::InvalidEncoding(msg) => write!(f, "Invalid string encoding: {}", msg),
            PackStreamError::ValueTooLarge(t, s) => write!(f, "{} too large: {} elements", t, s),
            PackStreamError::InvalidStructure(msg) => write!(f, "Invalid structure: {}", msg),
        }
    }
}

impl std::error::Error for PackStreamError {}

/// Field counts a registered structure tag accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructShape {
    /// Fewest fields
    pub min_fields: usize,
    /// Most fields
    pub max_fields: usize,
}

impl StructShape {
    /// Exactly `n` fields.
    pub const fn exact(n: usize) -> Self {
        Self {
            min_fields: n,
            max_fields: n,
        }
    }

    /// Between `min` and `max` fields, inclusive.
    pub const fn between(min: usize, max: usize) -> Self {
        Self {
            min_fields: min,
            max_fields: max,
        }
    }

    /// Whether `count` fields fit this shape.
    pub fn accepts(&self, count: usize) -> bool {
        (self.min_fields..=self.max_fields).contains(&count)
    }
}

impl fmt::Display for StructShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min_fields == self.max_fields {
            write!(f, "{}", self.min_fields)
        } else {
            write!(f, "{}..={}", self.min_fields, self.max_fields)
        }
    }
}

/// Source of the structure tags a decoder may accept.
pub trait StructRegistry: Send + Sync {
    /// Shape registered for `tag`, or `None` if the tag is unknown.
    fn struct_shape(&self, tag: u8) -> Option<StructShape>;
}
