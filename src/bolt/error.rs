//! Bolt protocol error types.

use std::io;

use thiserror::Error;

use super::handshake::BoltVersion;
use super::packstream::PackStreamError;

/// Result type for Bolt operations.
pub type BoltResult<T> = Result<T, BoltError>;

/// Bolt protocol errors.
#[derive(Debug, Error)]
pub enum BoltError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Handshake error
    #[error("Handshake error: {0}")]
    Handshake(#[from] HandshakeError),

    /// PackStream serialization error
    #[error("PackStream error: {0}")]
    PackStream(#[from] PackStreamError),

    /// The message does not exist in the negotiated protocol version
    #[error("{message} is not supported by Bolt {version}")]
    UnsupportedByProtocolVersion {
        /// Message name
        message: &'static str,
        /// Active protocol version
        version: BoltVersion,
    },

    /// Protocol error (unexpected message, bad field shape, etc.)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Message too large
    #[error("Message too large: {size} bytes (max: {max})")]
    MessageTooLarge {
        /// Actual size
        size: usize,
        /// Configured limit
        max: usize,
    },

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Connection closed
    #[error("Connection closed")]
    ConnectionClosed,
}

impl BoltError {
    /// Create a protocol error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        BoltError::Protocol(msg.into())
    }

    /// Whether the connection that produced this error must be discarded.
    ///
    /// Codec and transport errors leave the byte stream in an unknown
    /// position, so nothing more can be read from it.
    pub fn is_connection_fatal(&self) -> bool {
        !matches!(self, BoltError::UnsupportedByProtocolVersion { .. })
    }

    /// Whether picking another protocol version could still avoid this error.
    ///
    /// Only true for an unsupported message while no version has been
    /// negotiated yet.
    pub fn recoverable_by_renegotiation(&self, negotiated: bool) -> bool {
        matches!(self, BoltError::UnsupportedByProtocolVersion { .. }) && !negotiated
    }
}

/// Handshake-specific errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandshakeError {
    /// The server rejected every proposed version
    #[error("No compatible protocol version found")]
    NoCompatibleVersion,

    /// The server replied with a version the client did not propose
    #[error("Server chose unproposed version {major}.{minor}")]
    UnexpectedVersion {
        /// Major version
        major: u8,
        /// Minor version
        minor: u8,
    },

    /// The server replied with something other than a version (e.g. HTTP)
    #[error("Invalid handshake data: {0}")]
    InvalidData(String),

    /// Connection closed during handshake
    #[error("Connection closed during handshake")]
    ConnectionClosed,

    /// Handshake timeout
    #[error("Handshake timed out")]
    Timeout,
}

/// Server failure codes the client reacts to.
pub struct BoltErrorCode;

impl BoltErrorCode {
    // Client errors
    /// Wrong credentials
    pub const AUTHENTICATION_FAILED: &'static str = "Neo.ClientError.Security.AuthenticationFailed";
    /// Not allowed to perform the operation
    pub const UNAUTHORIZED: &'static str = "Neo.ClientError.Security.Unauthorized";
    /// Auth token has expired
    pub const TOKEN_EXPIRED: &'static str = "Neo.ClientError.Security.TokenExpired";
    /// Authorization info has expired on the server
    pub const AUTHORIZATION_EXPIRED: &'static str = "Neo.ClientError.Security.AuthorizationExpired";
    /// Query syntax error
    pub const SYNTAX_ERROR: &'static str = "Neo.ClientError.Statement.SyntaxError";
    /// Bookmark not recognized by the server
    pub const INVALID_BOOKMARK: &'static str = "Neo.ClientError.Transaction.InvalidBookmark";
    /// Bookmarks from different databases mixed
    pub const INVALID_BOOKMARK_MIXTURE: &'static str =
        "Neo.ClientError.Transaction.InvalidBookmarkMixture";
    /// No such database
    pub const DATABASE_NOT_FOUND: &'static str = "Neo.ClientError.Database.DatabaseNotFound";
    /// Write sent to a cluster member that is not the leader
    pub const NOT_A_LEADER: &'static str = "Neo.ClientError.Cluster.NotALeader";
    /// Write sent to a read-only database
    pub const FORBIDDEN_ON_READ_ONLY: &'static str =
        "Neo.ClientError.General.ForbiddenOnReadOnlyDatabase";

    // Database errors
    /// Unknown database error
    pub const GENERAL_ERROR: &'static str = "Neo.DatabaseError.General.UnknownError";

    // Transient errors (retry may succeed)
    /// Database temporarily unavailable
    pub const DATABASE_UNAVAILABLE: &'static str =
        "Neo.TransientError.General.DatabaseUnavailable";
    /// Transaction terminated
    pub const TERMINATED: &'static str = "Neo.TransientError.Transaction.Terminated";
    /// Lock client stopped
    pub const LOCK_CLIENT_STOPPED: &'static str =
        "Neo.TransientError.Transaction.LockClientStopped";

    /// Prefix shared by every security failure.
    pub const SECURITY_PREFIX: &'static str = "Neo.ClientError.Security.";
    /// Prefix shared by every transient failure.
    pub const TRANSIENT_PREFIX: &'static str = "Neo.TransientError.";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_error_display() {
        let err = HandshakeError::NoCompatibleVersion;
        assert!(err.to_string().contains("No compatible"));

        let err = HandshakeError::UnexpectedVersion { major: 3, minor: 0 };
        assert_eq!(err.to_string(), "Server chose unproposed version 3.0");
    }

    #[test]
    fn test_bolt_error_conversions() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        assert!(matches!(BoltError::from(io_err), BoltError::Io(_)));
        assert!(matches!(
            BoltError::from(HandshakeError::NoCompatibleVersion),
            BoltError::Handshake(_)
        ));
        assert!(matches!(
            BoltError::from(PackStreamError::UnexpectedEndOfStream),
            BoltError::PackStream(_)
        ));
    }

    #[test]
    fn test_unsupported_message_display() {
        let err = BoltError::UnsupportedByProtocolVersion {
            message: "ROUTE",
            version: BoltVersion::V4_2,
        };
        assert_eq!(err.to_string(), "ROUTE is not supported by Bolt 4.2");
    }

    #[test]
    fn test_renegotiation_only_before_negotiation() {
        let err = BoltError::UnsupportedByProtocolVersion {
            message: "LOGON",
            version: BoltVersion::V5_0,
        };
        assert!(err.recoverable_by_renegotiation(false));
        assert!(!err.recoverable_by_renegotiation(true));
        assert!(!err.is_connection_fatal());

        let err = BoltError::from(PackStreamError::MalformedStream("bad".into()));
        assert!(!err.recoverable_by_renegotiation(false));
        assert!(err.is_connection_fatal());
    }

    #[test]
    fn test_error_code_prefixes() {
        assert!(BoltErrorCode::AUTHENTICATION_FAILED.starts_with(BoltErrorCode::SECURITY_PREFIX));
        assert!(BoltErrorCode::DATABASE_UNAVAILABLE.starts_with(BoltErrorCode::TRANSIENT_PREFIX));
        assert!(BoltErrorCode::GENERAL_ERROR.starts_with("Neo.DatabaseError"));
    }
}
