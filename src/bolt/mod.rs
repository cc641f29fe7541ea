//! # Bolt wire layer
//!
//! Byte-level pieces of the Bolt protocol, from the client's side:
//!
//! - [`endian`] - host/network byte order conversion
//! - [`packstream`] - value encoding and decoding
//! - [`message`] - typed request and response messages
//! - [`catalog`] - which messages and structures each protocol version allows
//! - [`handshake`] - version proposal and negotiation
//! - [`codec`] - chunked framing for tokio
//! - [`error`] - protocol error types
//!
//! Everything here is synchronous and free of shared mutable state.

pub mod catalog;
pub mod codec;
pub mod endian;
pub mod error;
pub mod handshake;
pub mod message;
pub mod packstream;

pub use catalog::{MessageCatalog, RequestEntry, ResponseEntry};
pub use codec::{BoltClientCodec, ChunkCodec};
pub use error::{BoltError, BoltErrorCode, BoltResult, HandshakeError};
pub use handshake::{BoltVersion, Handshake, BOLT_MAGIC, HANDSHAKE_RESPONSE_SIZE};
pub use message::{
    AccessMode, AuthToken, BeginMessage, BoltRequest, BoltResponse, DiscardMessage,
    FailureMessage, HelloMessage, LogonMessage, MessageType, Notification, NotificationSeverity,
    PullMessage, QueryPlan, QueryStats, RecordMessage, RouteMessage, RunMessage, SuccessMessage,
    TelemetryMessage,
};
pub use packstream::{
    Metadata, PackStreamDecoder, PackStreamEncoder, PackStreamError, PackStreamStructure,
    PackStreamValue,
};
