//! PackStream decoder.

use std::collections::hash_map::Entry;

use super::marker::{classify, Marker, END_OF_STREAM};
use super::types::{Metadata, PackStreamStructure, PackStreamValue};
use super::{PackStreamError, StructRegistry};
use crate::bolt::endian;

/// Deepest nesting of lists, maps and structures accepted on decode.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Reads PackStream values from a borrowed byte slice.
pub struct PackStreamDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    registry: Option<&'a dyn StructRegistry>,
    envelope: Option<&'a dyn StructRegistry>,
}

impl<'a> PackStreamDecoder<'a> {
    /// Decoder that accepts any structure tag.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            registry: None,
            envelope: None,
        }
    }

    /// Decoder that only accepts structures registered in `registry`.
    pub fn with_registry(data: &'a [u8], registry: &'a dyn StructRegistry) -> Self {
        Self {
            data,
            pos: 0,
            registry: Some(registry),
            envelope: None,
        }
    }

    /// Check a top-level structure against `envelope` instead of the registry.
    ///
    /// Nested structures still go through the registry, so message tags
    /// never pass as values.
    pub fn with_envelope(mut self, envelope: &'a dyn StructRegistry) -> Self {
        self.envelope = Some(envelope);
        self
    }

    /// Current read offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Check if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Decode the next value.
    pub fn decode(&mut self) -> Result<PackStreamValue, PackStreamError> {
        self.decode_value(0)
    }

    fn decode_value(&mut self, depth: usize) -> Result<PackStreamValue, PackStreamError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(PackStreamError::MalformedStream(format!(
                "nesting deeper than {} levels",
                MAX_NESTING_DEPTH
            )));
        }

        let marker = self.read_u8()?;
        match classify(marker) {
            Marker::Null => Ok(PackStreamValue::Null),
            Marker::Bool(b) => Ok(PackStreamValue::Boolean(b)),
            Marker::TinyInt(i) => Ok(PackStreamValue::Integer(i64::from(i))),
            Marker::Int(width) => self.read_int(width).map(PackStreamValue::Integer),
            Marker::Float64 => {
                let raw = self.read_array::<8>()?;
                Ok(PackStreamValue::Float(f64::from_ne_bytes(endian::from_wire(raw))))
            }
            Marker::Bytes(width) => {
                let len = self.read_len(width)?;
                Ok(PackStreamValue::Bytes(self.read_slice(len)?.to_vec()))
            }
            Marker::TinyString(len) => self.read_string(len),
            Marker::String(width) => {
                let len = self.read_len(width)?;
                self.read_string(len)
            }
            Marker::TinyList(len) => self.read_list(len, depth),
            Marker::List(width) => {
                let len = self.read_len(width)?;
                self.read_list(len, depth)
            }
            Marker::ListStream => self.read_list_stream(depth),
            Marker::TinyMap(len) => self.read_map(len, depth),
            Marker::Map(width) => {
                let len = self.read_len(width)?;
                self.read_map(len, depth)
            }
            Marker::MapStream => self.read_map_stream(depth),
            Marker::TinyStruct(len) => self.read_struct(len, depth),
            Marker::Struct(width) => {
                let len = self.read_len(width)?;
                self.read_struct(len, depth)
            }
            Marker::EndOfStream => Err(PackStreamError::MalformedStream(
                "end-of-stream marker outside a streamed collection".to_string(),
            )),
            Marker::Reserved(m) => Err(PackStreamError::MalformedStream(format!(
                "unknown marker 0x{:02X} at offset {}",
                m,
                self.pos - 1
            ))),
        }
    }

    fn read_string(&mut self, len: usize) -> Result<PackStreamValue, PackStreamError> {
        let bytes = self.read_slice(len)?;
        let s = std::str::from_utf8(bytes)
            .map_err(|e| PackStreamError::InvalidEncoding(e.to_string()))?;
        Ok(PackStreamValue::String(s.to_string()))
    }

    fn read_list(&mut self, len: usize, depth: usize) -> Result<PackStreamValue, PackStreamError> {
        let mut items = Vec::with_capacity(len.min(self.remaining()));
        for _ in 0..len {
            items.push(self.decode_value(depth + 1)?);
        }
        Ok(PackStreamValue::List(items))
    }

    fn read_list_stream(&mut self, depth: usize) -> Result<PackStreamValue, PackStreamError> {
        let mut items = Vec::new();
        while !self.take_end_of_stream()? {
            items.push(self.decode_value(depth + 1)?);
        }
        Ok(PackStreamValue::List(items))
    }

    fn read_map(&mut self, len: usize, depth: usize) -> Result<PackStreamValue, PackStreamError> {
        let mut map = Metadata::with_capacity(len.min(self.remaining()));
        for _ in 0..len {
            self.read_entry(&mut map, depth)?;
        }
        Ok(PackStreamValue::Map(map))
    }

    fn read_map_stream(&mut self, depth: usize) -> Result<PackStreamValue, PackStreamError> {
        let mut map = Metadata::new();
        while !self.take_end_of_stream()? {
            self.read_entry(&mut map, depth)?;
        }
        Ok(PackStreamValue::Map(map))
    }

    fn read_entry(&mut self, map: &mut Metadata, depth: usize) -> Result<(), PackStreamError> {
        let key = match self.decode_value(depth + 1)? {
            PackStreamValue::String(s) => s,
            other => {
                return Err(PackStreamError::MalformedStream(format!(
                    "map key must be a string, got {}",
                    other.type_name()
                )))
            }
        };
        let value = self.decode_value(depth + 1)?;
        match map.entry(key) {
            Entry::Occupied(e) => Err(PackStreamError::MalformedStream(format!(
                "duplicate map key {:?}",
                e.key()
            ))),
            Entry::Vacant(e) => {
                e.insert(value);
                Ok(())
            }
        }
    }

    fn read_struct(&mut self, field_count: usize, depth: usize) -> Result<PackStreamValue, PackStreamError> {
        let tag = self.read_u8()?;

        let registry = if depth == 0 {
            self.envelope.or(self.registry)
        } else {
            self.registry
        };
        if let Some(registry) = registry {
            let shape = registry
                .struct_shape(tag)
                .ok_or(PackStreamError::StructTagMismatch { tag })?;
            if !shape.accepts(field_count) {
                return Err(PackStreamError::MalformedStream(format!(
                    "structure 0x{:02X} carries {} fields, expected {}",
                    tag, field_count, shape
                )));
            }
        }

        let mut fields = Vec::with_capacity(field_count.min(self.remaining()));
        for _ in 0..field_count {
            fields.push(self.decode_value(depth + 1)?);
        }
        Ok(PackStreamValue::Structure(PackStreamStructure::new(tag, fields)))
    }

    fn take_end_of_stream(&mut self) -> Result<bool, PackStreamError> {
        match self.data.get(self.pos) {
            Some(&END_OF_STREAM) => {
                self.pos += 1;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(PackStreamError::UnexpectedEndOfStream),
        }
    }

    fn read_int(&mut self, width: usize) -> Result<i64, PackStreamError> {
        Ok(match width {
            1 => i64::from(self.read_u8()? as i8),
            2 => i64::from(i16::from_ne_bytes(endian::from_wire(self.read_array()?))),
            4 => i64::from(i32::from_ne_bytes(endian::from_wire(self.read_array()?))),
            _ => i64::from_ne_bytes(endian::from_wire(self.read_array()?)),
        })
    }

    fn read_len(&mut self, width: usize) -> Result<usize, PackStreamError> {
        Ok(match width {
            1 => self.read_u8()? as usize,
            2 => u16::from_ne_bytes(endian::from_wire(self.read_array()?)) as usize,
            _ => u32::from_ne_bytes(endian::from_wire(self.read_array()?)) as usize,
        })
    }

    fn read_u8(&mut self) -> Result<u8, PackStreamError> {
        let value = *self
            .data
            .get(self.pos)
            .ok_or(PackStreamError::UnexpectedEndOfStream)?;
        self.pos += 1;
        Ok(value)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], PackStreamError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_slice(N)?);
        Ok(out)
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], PackStreamError> {
        if self.remaining() < len {
            return Err(PackStreamError::UnexpectedEndOfStream);
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }
}

/// Decode exactly one value; trailing bytes are an error.
pub fn decode(data: &[u8]) -> Result<PackStreamValue, PackStreamError> {
    let mut decoder = PackStreamDecoder::new(data);
    let value = decoder.decode()?;
    if !decoder.is_empty() {
        return Err(PackStreamError::MalformedStream(format!(
            "{} trailing bytes after value",
            decoder.remaining()
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bolt::packstream::marker::*;
    use crate::bolt::packstream::StructShape;

    struct OnlyNodes;

    impl StructRegistry for OnlyNodes {
        fn struct_shape(&self, tag: u8) -> Option<StructShape> {
            (tag == NODE).then_some(StructShape::exact(3))
        }
    }

    #[test]
    fn test_every_int_width_widens_to_i64() {
        assert_eq!(decode(&[0xF0]).unwrap(), PackStreamValue::Integer(-16));
        assert_eq!(decode(&[INT_8, 0x80]).unwrap(), PackStreamValue::Integer(-128));
        assert_eq!(decode(&[INT_16, 0x7F, 0xFF]).unwrap(), PackStreamValue::Integer(32767));
        assert_eq!(
            decode(&[INT_32, 0x80, 0x00, 0x00, 0x00]).unwrap(),
            PackStreamValue::Integer(i64::from(i32::MIN))
        );
        // Servers may pick a wider form than needed.
        assert_eq!(
            decode(&[INT_64, 0, 0, 0, 0, 0, 0, 0, 0x05]).unwrap(),
            PackStreamValue::Integer(5)
        );
    }

    #[test]
    fn test_unknown_marker_is_malformed() {
        let err = decode(&[0xC7]).unwrap_err();
        assert!(matches!(err, PackStreamError::MalformedStream(_)), "{:?}", err);
    }

    #[test]
    fn test_truncated_payloads() {
        for data in [
            &[][..],
            &[INT_16, 0x01][..],
            &[FLOAT_64, 0, 0, 0][..],
            &[0x83, b'a', b'b'][..],
            &[STRING_8][..],
            &[0x92, 0x01][..],
            &[0xB1, 0x4E][..],
            &[LIST_STREAM, 0x01][..],
        ] {
            assert!(
                matches!(decode(data), Err(PackStreamError::UnexpectedEndOfStream)),
                "{:02X?}",
                data
            );
        }
    }

    #[test]
    fn test_invalid_utf8_is_invalid_encoding() {
        let err = decode(&[0x82, 0xC3, 0x28]).unwrap_err();
        assert!(matches!(err, PackStreamError::InvalidEncoding(_)));
    }

    #[test]
    fn test_non_string_map_key() {
        let err = decode(&[0xA1, 0x01, 0x02]).unwrap_err();
        assert!(matches!(err, PackStreamError::MalformedStream(_)));
    }

    #[test]
    fn test_duplicate_map_key() {
        let err = decode(&[0xA2, 0x81, b'a', 0x01, 0x81, b'a', 0x02]).unwrap_err();
        assert!(matches!(err, PackStreamError::MalformedStream(_)));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        assert!(matches!(
            decode(&[0x01, 0x02]),
            Err(PackStreamError::MalformedStream(_))
        ));
    }

    #[test]
    fn test_streamed_collections() {
        let list = decode(&[LIST_STREAM, 0x01, 0x81, b'x', END_OF_STREAM]).unwrap();
        assert_eq!(
            list,
            PackStreamValue::List(vec![1i64.into(), "x".into()])
        );

        let map = decode(&[MAP_STREAM, 0x81, b'k', 0x02, END_OF_STREAM]).unwrap();
        assert_eq!(map.as_map().unwrap().get("k"), Some(&PackStreamValue::Integer(2)));

        let stray = decode(&[END_OF_STREAM]).unwrap_err();
        assert!(matches!(stray, PackStreamError::MalformedStream(_)));
    }

    #[test]
    fn test_registry_rejects_unknown_tag() {
        let data = [0xB1, 0x70, 0xA0];
        let mut decoder = PackStreamDecoder::with_registry(&data, &OnlyNodes);
        assert!(matches!(
            decoder.decode(),
            Err(PackStreamError::StructTagMismatch { tag: 0x70 })
        ));

        // Without a registry the same bytes decode.
        assert!(decode(&data).is_ok());
    }

    #[test]
    fn test_registry_checks_field_count() {
        let data = [0xB2, NODE, 0x01, 0x90];
        let mut decoder = PackStreamDecoder::with_registry(&data, &OnlyNodes);
        assert!(matches!(decoder.decode(), Err(PackStreamError::MalformedStream(_))));

        let data = [0xB3, NODE, 0x01, 0x90, 0xA0];
        let mut decoder = PackStreamDecoder::with_registry(&data, &OnlyNodes);
        assert!(decoder.decode().is_ok());
    }

    #[test]
    fn test_nested_structure_checked_against_registry() {
        // A list holding a structure with an unregistered tag.
        let data = [0x91, 0xB0, 0x99];
        let mut decoder = PackStreamDecoder::with_registry(&data, &OnlyNodes);
        assert!(matches!(
            decoder.decode(),
            Err(PackStreamError::StructTagMismatch { tag: 0x99 })
        ));
    }

    #[test]
    fn test_envelope_only_applies_at_top_level() {
        struct Envelope;

        impl StructRegistry for Envelope {
            fn struct_shape(&self, tag: u8) -> Option<StructShape> {
                (tag == 0x71).then_some(StructShape::exact(1))
            }
        }

        let data = [0xB1, 0x71, 0x91, 0xB3, NODE, 0x01, 0x90, 0xA0];
        let mut decoder = PackStreamDecoder::with_registry(&data, &OnlyNodes).with_envelope(&Envelope);
        assert!(decoder.decode().is_ok());

        // the envelope tag is not accepted as a nested value
        let data = [0xB1, 0x71, 0x91, 0xB1, 0x71, 0x90];
        let mut decoder = PackStreamDecoder::with_registry(&data, &OnlyNodes).with_envelope(&Envelope);
        assert!(matches!(
            decoder.decode(),
            Err(PackStreamError::StructTagMismatch { tag: 0x71 })
        ));

        // nor is a registered value struct accepted as the envelope
        let data = [0xB3, NODE, 0x01, 0x90, 0xA0];
        let mut decoder = PackStreamDecoder::with_registry(&data, &OnlyNodes).with_envelope(&Envelope);
        assert!(matches!(
            decoder.decode(),
            Err(PackStreamError::StructTagMismatch { tag: NODE })
        ));
    }

    #[test]
    fn test_nesting_limit() {
        let mut data = vec![0x91; MAX_NESTING_DEPTH + 2];
        data.push(0x00);
        assert!(matches!(decode(&data), Err(PackStreamError::MalformedStream(_))));
    }

    #[test]
    fn test_huge_declared_length_does_not_allocate() {
        let err = decode(&[LIST_32, 0xFF, 0xFF, 0xFF, 0xFF]).unwrap_err();
        assert!(matches!(err, PackStreamError::UnexpectedEndOfStream));
    }
}
