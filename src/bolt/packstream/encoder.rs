//! PackStream encoder.

use bytes::{BufMut, BytesMut};

use super::marker::*;
use super::types::{Metadata, PackStreamStructure, PackStreamValue};
use super::PackStreamError;
use crate::bolt::endian;

/// Writes PackStream values into an owned buffer.
///
/// The encoder keeps no state besides its buffer, so independent encoders
/// can run on as many tasks as needed.
#[derive(Debug, Default)]
pub struct PackStreamEncoder {
    buffer: BytesMut,
}

impl PackStreamEncoder {
    /// Create a new encoder with default buffer capacity.
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create a new encoder with specified buffer capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Consume the encoder and return the bytes.
    pub fn into_bytes(self) -> BytesMut {
        self.buffer
    }

    /// Written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Encode any value.
    pub fn encode(&mut self, value: &PackStreamValue) -> Result<(), PackStreamError> {
        match value {
            PackStreamValue::Null => self.encode_null(),
            PackStreamValue::Boolean(b) => self.encode_bool(*b),
            PackStreamValue::Integer(i) => self.encode_int(*i),
            PackStreamValue::Float(f) => self.encode_float(*f),
            PackStreamValue::Bytes(b) => return self.encode_bytes(b),
            PackStreamValue::String(s) => return self.encode_string(s),
            PackStreamValue::List(l) => return self.encode_list(l),
            PackStreamValue::Map(m) => return self.encode_map(m),
            PackStreamValue::Structure(s) => return self.encode_structure(s),
        }
        Ok(())
    }

    /// Encode null.
    pub fn encode_null(&mut self) {
        self.buffer.put_u8(NULL);
    }

    /// Encode a boolean.
    pub fn encode_bool(&mut self, value: bool) {
        self.buffer.put_u8(if value { TRUE } else { FALSE });
    }

    /// Encode an integer in the smallest lossless form.
    pub fn encode_int(&mut self, value: i64) {
        if is_tiny_int(value) {
            self.buffer.put_u8(value as i8 as u8);
        } else if let Ok(v) = i8::try_from(value) {
            self.buffer.put_u8(INT_8);
            self.put_wire(v.to_ne_bytes());
        } else if let Ok(v) = i16::try_from(value) {
            self.buffer.put_u8(INT_16);
            self.put_wire(v.to_ne_bytes());
        } else if let Ok(v) = i32::try_from(value) {
            self.buffer.put_u8(INT_32);
            self.put_wire(v.to_ne_bytes());
        } else {
            self.buffer.put_u8(INT_64);
            self.put_wire(value.to_ne_bytes());
        }
    }

    /// Encode a float (always 64-bit).
    pub fn encode_float(&mut self, value: f64) {
        self.buffer.put_u8(FLOAT_64);
        self.put_wire(value.to_ne_bytes());
    }

    /// Encode a byte array. Byte arrays have no tiny form.
    pub fn encode_bytes(&mut self, value: &[u8]) -> Result<(), PackStreamError> {
        self.put_size_header(value.len(), None, [BYTES_8, BYTES_16, BYTES_32], "bytes")?;
        self.buffer.put_slice(value);
        Ok(())
    }

    /// Encode a string.
    pub fn encode_string(&mut self, value: &str) -> Result<(), PackStreamError> {
        let bytes = value.as_bytes();
        self.put_size_header(bytes.len(), Some(TINY_STRING), [STRING_8, STRING_16, STRING_32], "string")
            .map_err(|_| {
                PackStreamError::InvalidEncoding(format!(
                    "string of {} bytes exceeds the largest size class",
                    bytes.len()
                ))
            })?;
        self.buffer.put_slice(bytes);
        Ok(())
    }

    /// Encode a list with a length prefix.
    pub fn encode_list(&mut self, values: &[PackStreamValue]) -> Result<(), PackStreamError> {
        self.put_size_header(values.len(), Some(TINY_LIST), [LIST_8, LIST_16, LIST_32], "list")?;
        values.iter().try_for_each(|v| self.encode(v))
    }

    /// Encode a map with a length prefix.
    pub fn encode_map(&mut self, map: &Metadata) -> Result<(), PackStreamError> {
        self.put_size_header(map.len(), Some(TINY_MAP), [MAP_8, MAP_16, MAP_32], "map")?;
        for (key, value) in map {
            self.encode_string(key)?;
            self.encode(value)?;
        }
        Ok(())
    }

    /// Encode a list whose length is not written up front.
    ///
    /// Elements follow [`LIST_STREAM`] and the list is closed with
    /// [`END_OF_STREAM`].
    pub fn encode_list_stream<'v, I>(&mut self, values: I) -> Result<(), PackStreamError>
    where
        I: IntoIterator<Item = &'v PackStreamValue>,
    {
        self.buffer.put_u8(LIST_STREAM);
        for value in values {
            self.encode(value)?;
        }
        self.buffer.put_u8(END_OF_STREAM);
        Ok(())
    }

    /// Encode a map whose entry count is not written up front.
    pub fn encode_map_stream<'v, I>(&mut self, entries: I) -> Result<(), PackStreamError>
    where
        I: IntoIterator<Item = (&'v String, &'v PackStreamValue)>,
    {
        self.buffer.put_u8(MAP_STREAM);
        for (key, value) in entries {
            self.encode_string(key)?;
            self.encode(value)?;
        }
        self.buffer.put_u8(END_OF_STREAM);
        Ok(())
    }

    /// Encode a structure: size marker, tag, then fields in order.
    pub fn encode_structure(&mut self, s: &PackStreamStructure) -> Result<(), PackStreamError> {
        let count = s.fields.len();
        if count <= TINY_MAX {
            self.buffer.put_u8(TINY_STRUCT | count as u8);
        } else if count <= u8::MAX as usize {
            self.buffer.put_u8(STRUCT_8);
            self.buffer.put_u8(count as u8);
        } else if count <= MAX_STRUCT_FIELDS {
            self.buffer.put_u8(STRUCT_16);
            self.put_wire((count as u16).to_ne_bytes());
        } else {
            return Err(PackStreamError::ValueTooLarge("structure", count));
        }
        self.buffer.put_u8(s.tag);
        s.fields.iter().try_for_each(|f| self.encode(f))
    }

    fn put_wire<const N: usize>(&mut self, native: [u8; N]) {
        self.buffer.put_slice(&endian::to_wire(native));
    }

    fn put_size_header(
        &mut self,
        len: usize,
        tiny: Option<u8>,
        sized: [u8; 3],
        what: &'static str,
    ) -> Result<(), PackStreamError> {
        match tiny {
            Some(base) if len <= TINY_MAX => {
                self.buffer.put_u8(base | len as u8);
                return Ok(());
            }
            _ => {}
        }
        if len <= u8::MAX as usize {
            self.buffer.put_u8(sized[0]);
            self.buffer.put_u8(len as u8);
        } else if len <= u16::MAX as usize {
            self.buffer.put_u8(sized[1]);
            self.put_wire((len as u16).to_ne_bytes());
        } else if len <= u32::MAX as usize {
            self.buffer.put_u8(sized[2]);
            self.put_wire((len as u32).to_ne_bytes());
        } else {
            return Err(PackStreamError::ValueTooLarge(what, len));
        }
        Ok(())
    }
}

/// Encode a single value into a fresh buffer.
pub fn encode(value: &PackStreamValue) -> Result<BytesMut, PackStreamError> {
    let mut encoder = PackStreamEncoder::new();
    encoder.encode(value)?;
    Ok(encoder.into_bytes())
}
