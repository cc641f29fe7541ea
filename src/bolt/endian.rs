//! Conversion between host byte order and the wire's big-endian order.
//!
//! Every multi-byte numeric in PackStream and in the chunk/handshake framing
//! is big-endian. The encoder produces native bytes with `to_ne_bytes` and
//! hands them to [`to_wire`]; the decoder does the reverse with
//! [`from_wire`] and `from_ne_bytes`.

/// Whether the host needs byte swapping to talk to the wire.
#[inline]
pub const fn host_is_little_endian() -> bool {
    cfg!(target_endian = "little")
}

/// Convert native-order bytes into wire (big-endian) order.
#[inline]
pub fn to_wire<const N: usize>(mut bytes: [u8; N]) -> [u8; N] {
    if host_is_little_endian() {
        bytes.reverse();
    }
    bytes
}

/// Convert wire (big-endian) bytes into native order.
#[inline]
pub fn from_wire<const N: usize>(bytes: [u8; N]) -> [u8; N] {
    // Byte reversal is its own inverse.
    to_wire(bytes)
}

/// Slice form of [`to_wire`]; always returns a fresh buffer.
pub fn to_wire_vec(bytes: &[u8]) -> Vec<u8> {
    let mut out = bytes.to_vec();
    if host_is_little_endian() {
        out.reverse();
    }
    out
}

/// Slice form of [`from_wire`]; always returns a fresh buffer.
pub fn from_wire_vec(bytes: &[u8]) -> Vec<u8> {
    to_wire_vec(bytes)
}
