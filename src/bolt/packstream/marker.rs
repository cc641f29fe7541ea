//! PackStream marker bytes and struct tags.
//!
//! Every encoded value starts with one marker byte. Tiny forms pack the
//! size into the low nibble of the marker; the sized forms are followed by
//! a big-endian length of 1, 2 or 4 bytes.

/// Null
pub const NULL: u8 = 0xC0;
/// 64-bit IEEE 754 float, big-endian payload
pub const FLOAT_64: u8 = 0xC1;
/// Boolean false
pub const FALSE: u8 = 0xC2;
/// Boolean true
pub const TRUE: u8 = 0xC3;

/// Integer with a 1-byte payload
pub const INT_8: u8 = 0xC8;
/// Integer with a 2-byte payload
pub const INT_16: u8 = 0xC9;
/// Integer with a 4-byte payload
pub const INT_32: u8 = 0xCA;
/// Integer with an 8-byte payload
pub const INT_64: u8 = 0xCB;

/// Byte array, 1-byte length
pub const BYTES_8: u8 = 0xCC;
/// Byte array, 2-byte length
pub const BYTES_16: u8 = 0xCD;
/// Byte array, 4-byte length
pub const BYTES_32: u8 = 0xCE;

/// Tiny string base (0x80-0x8F, length in the low nibble)
pub const TINY_STRING: u8 = 0x80;
/// String, 1-byte length
pub const STRING_8: u8 = 0xD0;
/// String, 2-byte length
pub const STRING_16: u8 = 0xD1;
/// String, 4-byte length
pub const STRING_32: u8 = 0xD2;

/// Tiny list base (0x90-0x9F)
pub const TINY_LIST: u8 = 0x90;
/// List, 1-byte length
pub const LIST_8: u8 = 0xD4;
/// List, 2-byte length
pub const LIST_16: u8 = 0xD5;
/// List, 4-byte length
pub const LIST_32: u8 = 0xD6;
/// List of unknown length, closed by [`END_OF_STREAM`].
pub const LIST_STREAM: u8 = 0xD7;

/// Tiny map base (0xA0-0xAF)
pub const TINY_MAP: u8 = 0xA0;
/// Map, 1-byte length
pub const MAP_8: u8 = 0xD8;
/// Map, 2-byte length
pub const MAP_16: u8 = 0xD9;
/// Map, 4-byte length
pub const MAP_32: u8 = 0xDA;
/// Map of unknown length, closed by [`END_OF_STREAM`].
pub const MAP_STREAM: u8 = 0xDB;

/// Tiny struct base (0xB0-0xBF, field count in the low nibble)
pub const TINY_STRUCT: u8 = 0xB0;
/// Struct, 1-byte field count
pub const STRUCT_8: u8 = 0xDC;
/// Struct, 2-byte field count
pub const STRUCT_16: u8 = 0xDD;

/// Terminates a streamed list or map
pub const END_OF_STREAM: u8 = 0xDF;

/// Largest size that fits in the low nibble of a tiny marker.
pub const TINY_MAX: usize = 0x0F;

/// Inclusive range of integers encoded directly in the marker byte.
pub const TINY_INT_MIN: i64 = -16;
/// Upper end of the tiny integer range
pub const TINY_INT_MAX: i64 = 127;

/// Most fields a struct can carry (STRUCT_16).
pub const MAX_STRUCT_FIELDS: usize = u16::MAX as usize;

// Graph structs

/// Node
pub const NODE: u8 = b'N';
/// Relationship with both end nodes
pub const RELATIONSHIP: u8 = b'R';
/// Relationship inside a path, without end nodes
pub const UNBOUND_RELATIONSHIP: u8 = b'r';
/// Path
pub const PATH: u8 = b'P';

// Temporal structs

/// Date (days since epoch)
pub const DATE: u8 = b'D';
/// Time with offset
pub const TIME: u8 = b'T';
/// Local time
pub const LOCAL_TIME: u8 = b't';
/// Local date-time
pub const LOCAL_DATE_TIME: u8 = b'd';
/// Date-time with offset, seconds counted in local time (before 5.0).
pub const LEGACY_DATE_TIME: u8 = b'F';
/// Date-time with zone id, seconds counted in local time (before 5.0).
pub const LEGACY_DATE_TIME_ZONE_ID: u8 = b'f';
/// Date-time with offset, seconds counted in UTC (5.0+, or the 4.x "utc" patch).
pub const DATE_TIME: u8 = b'I';
/// Date-time with zone id, seconds counted in UTC (5.0+, or the 4.x "utc" patch).
pub const DATE_TIME_ZONE_ID: u8 = b'i';
/// Duration
pub const DURATION: u8 = b'E';

// Spatial structs

/// 2D point
pub const POINT_2D: u8 = b'X';
/// 3D point
pub const POINT_3D: u8 = b'Y';

/// What a marker byte announces, before any payload is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// Null
    Null,
    /// Boolean
    Bool(bool),
    /// Integer carried by the marker itself.
    TinyInt(i8),
    /// Integer payload of the given width in bytes.
    Int(usize),
    /// 64-bit float
    Float64,
    /// Byte array whose length prefix is `n` bytes wide.
    Bytes(usize),
    /// String of the given length
    TinyString(usize),
    /// String with an `n`-byte length prefix
    String(usize),
    /// List of the given length
    TinyList(usize),
    /// List with an `n`-byte length prefix
    List(usize),
    /// Streamed list
    ListStream,
    /// Map of the given length
    TinyMap(usize),
    /// Map with an `n`-byte length prefix
    Map(usize),
    /// Streamed map
    MapStream,
    /// Struct with the given field count
    TinyStruct(usize),
    /// Struct with an `n`-byte field count
    Struct(usize),
    /// End of a streamed collection
    EndOfStream,
    /// Reserved or undefined marker.
    Reserved(u8),
}

/// Classify a marker byte.
pub fn classify(marker: u8) -> Marker {
    match marker {
        0x00..=0x7F | 0xF0..=0xFF => Marker::TinyInt(marker as i8),
        0x80..=0x8F => Marker::TinyString(low_nibble(marker)),
        0x90..=0x9F => Marker::TinyList(low_nibble(marker)),
        0xA0..=0xAF => Marker::TinyMap(low_nibble(marker)),
        0xB0..=0xBF => Marker::TinyStruct(low_nibble(marker)),
        NULL => Marker::Null,
        FLOAT_64 => Marker::Float64,
        FALSE => Marker::Bool(false),
        TRUE => Marker::Bool(true),
        INT_8 => Marker::Int(1),
        INT_16 => Marker::Int(2),
        INT_32 => Marker::Int(4),
        INT_64 => Marker::Int(8),
        BYTES_8 => Marker::Bytes(1),
        BYTES_16 => Marker::Bytes(2),
        BYTES_32 => Marker::Bytes(4),
        STRING_8 => Marker::String(1),
        STRING_16 => Marker::String(2),
        STRING_32 => Marker::String(4),
        LIST_8 => Marker::List(1),
        LIST_16 => Marker::List(2),
        LIST_32 => Marker::List(4),
        LIST_STREAM => Marker::ListStream,
        MAP_8 => Marker::Map(1),
        MAP_16 => Marker::Map(2),
        MAP_32 => Marker::Map(4),
        MAP_STREAM => Marker::MapStream,
        STRUCT_8 => Marker::Struct(1),
        STRUCT_16 => Marker::Struct(2),
        END_OF_STREAM => Marker::EndOfStream,
        other => Marker::Reserved(other),
    }
}

#[inline]
fn low_nibble(marker: u8) -> usize {
    (marker & 0x0F) as usize
}

/// Whether an integer fits in the marker byte.
#[inline]
pub fn is_tiny_int(value: i64) -> bool {
    (TINY_INT_MIN..=TINY_INT_MAX).contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_tiny_ints() {
        assert_eq!(classify(0x00), Marker::TinyInt(0));
        assert_eq!(classify(0x7F), Marker::TinyInt(127));
        assert_eq!(classify(0xF0), Marker::TinyInt(-16));
        assert_eq!(classify(0xFF), Marker::TinyInt(-1));
    }

    #[test]
    fn test_classify_tiny_collections() {
        assert_eq!(classify(0x85), Marker::TinyString(5));
        assert_eq!(classify(0x9F), Marker::TinyList(15));
        assert_eq!(classify(0xA0), Marker::TinyMap(0));
        assert_eq!(classify(0xB3), Marker::TinyStruct(3));
    }

    #[test]
    fn test_classify_sized_markers() {
        assert_eq!(classify(INT_16), Marker::Int(2));
        assert_eq!(classify(BYTES_32), Marker::Bytes(4));
        assert_eq!(classify(STRING_8), Marker::String(1));
        assert_eq!(classify(MAP_16), Marker::Map(2));
        assert_eq!(classify(STRUCT_16), Marker::Struct(2));
        assert_eq!(classify(LIST_STREAM), Marker::ListStream);
        assert_eq!(classify(END_OF_STREAM), Marker::EndOfStream);
    }

    #[test]
    fn test_reserved_markers() {
        for m in [0xC4, 0xC5, 0xC6, 0xC7, 0xCF, 0xD3, 0xDE, 0xE0, 0xEF] {
            assert_eq!(classify(m), Marker::Reserved(m), "marker 0x{:02X}", m);
        }
    }

    #[test]
    fn test_tiny_int_bounds() {
        assert!(is_tiny_int(-16));
        assert!(is_tiny_int(127));
        assert!(!is_tiny_int(-17));
        assert!(!is_tiny_int(128));
    }
}
