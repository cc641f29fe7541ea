//! Bolt chunked framing for tokio_util.
//!
//! A message is split into chunks, each prefixed with a 2-byte big-endian
//! length, and terminated by a zero-length chunk. A terminator with no
//! chunks before it is a NOOP keep-alive and is skipped.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::catalog::MessageCatalog;
use super::endian;
use super::message::{BoltRequest, BoltResponse};
use super::BoltError;

/// Maximum chunk payload size
pub const MAX_CHUNK_SIZE: usize = 16384;

/// End of message marker (0x00 0x00)
pub const END_MARKER: [u8; 2] = [0x00, 0x00];

/// Default limit on one reassembled message (16 MiB)
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Split `data` into chunks and append them, plus the end marker, to `dst`.
pub fn write_chunked(data: &[u8], dst: &mut BytesMut) {
    dst.reserve(data.len() + 2 * (data.len() / MAX_CHUNK_SIZE + 2));
    for chunk in data.chunks(MAX_CHUNK_SIZE) {
        // chunks() never yields more than MAX_CHUNK_SIZE bytes, which fits u16
        dst.put_slice(&endian::to_wire((chunk.len() as u16).to_ne_bytes()));
        dst.put_slice(chunk);
    }
    dst.put_slice(&END_MARKER);
}

/// Message framing without any knowledge of message contents.
#[derive(Debug)]
pub struct ChunkCodec {
    max_message_size: usize,
    message_buffer: BytesMut,
}

impl ChunkCodec {
    /// Create a codec with the default message size limit.
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_MESSAGE_SIZE)
    }

    /// Create a codec with a custom message size limit.
    pub fn with_max_size(max_message_size: usize) -> Self {
        Self {
            max_message_size,
            message_buffer: BytesMut::with_capacity(4096),
        }
    }

    /// Whether part of a message has been received.
    pub fn in_message(&self) -> bool {
        !self.message_buffer.is_empty()
    }
}

impl Default for ChunkCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ChunkCodec {
    type Item = BytesMut;
    type Error = BoltError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            if src.len() < 2 {
                return Ok(None);
            }

            let chunk_size = u16::from_ne_bytes(endian::from_wire([src[0], src[1]])) as usize;

            if chunk_size == 0 {
                src.advance(2);
                if self.message_buffer.is_empty() {
                    // NOOP
                    continue;
                }
                return Ok(Some(self.message_buffer.split()));
            }

            if src.len() < 2 + chunk_size {
                src.reserve(2 + chunk_size - src.len());
                return Ok(None);
            }

            let size = self.message_buffer.len() + chunk_size;
            if size > self.max_message_size {
                return Err(BoltError::MessageTooLarge {
                    size,
                    max: self.max_message_size,
                });
            }

            src.advance(2);
            self.message_buffer.extend_from_slice(&src[..chunk_size]);
            src.advance(chunk_size);
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(buf)? {
            Some(message) => Ok(Some(message)),
            None if buf.is_empty() && !self.in_message() => Ok(None),
            None => Err(BoltError::ConnectionClosed),
        }
    }
}

impl Encoder<&[u8]> for ChunkCodec {
    type Error = BoltError;

    fn encode(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() > self.max_message_size {
            return Err(BoltError::MessageTooLarge {
                size: item.len(),
                max: self.max_message_size,
            });
        }
        write_chunked(item, dst);
        Ok(())
    }
}

/// Client-side codec: writes requests and reads responses through the
/// catalog of the negotiated protocol version.
#[derive(Debug)]
pub struct BoltClientCodec {
    chunks: ChunkCodec,
    catalog: &'static MessageCatalog,
}

impl BoltClientCodec {
    /// Create a codec bound to `catalog`.
    pub fn new(catalog: &'static MessageCatalog) -> Self {
        Self {
            chunks: ChunkCodec::new(),
            catalog,
        }
    }

    /// Create a codec with a custom message size limit.
    pub fn with_max_size(catalog: &'static MessageCatalog, max_message_size: usize) -> Self {
        Self {
            chunks: ChunkCodec::with_max_size(max_message_size),
            catalog,
        }
    }

    /// Catalog in use.
    pub fn catalog(&self) -> &'static MessageCatalog {
        self.catalog
    }

    /// Switch to the catalog of a negotiated patch. Only valid between messages.
    pub fn set_catalog(&mut self, catalog: &'static MessageCatalog) {
        self.catalog = catalog;
    }
}

impl Decoder for BoltClientCodec {
    type Item = BoltResponse;
    type Error = BoltError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.chunks.decode(src)? {
            Some(message) => self.catalog.decode_message(&message).map(Some),
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.chunks.decode_eof(buf)? {
            Some(message) => self.catalog.decode_message(&message).map(Some),
            None => Ok(None),
        }
    }
}

impl Encoder<&BoltRequest> for BoltClientCodec {
    type Error = BoltError;

    fn encode(&mut self, item: &BoltRequest, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let message = self.catalog.encode_message(item)?;
        self.chunks.encode(&message[..], dst)
    }
}
