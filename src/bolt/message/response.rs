//! Bolt protocol response messages.
//!
//! Responses are sent from the server to the client. `to_structure` exists
//! so tests and in-memory servers can produce them.

use std::collections::HashMap;

use super::tag;
use crate::bolt::error::{BoltError, BoltErrorCode, BoltResult};
use crate::bolt::packstream::{Metadata, PackStreamStructure, PackStreamValue};

/// All Bolt response messages.
#[derive(Debug, Clone, PartialEq)]
pub enum BoltResponse {
    /// SUCCESS - Operation completed successfully
    Success(SuccessMessage),
    /// RECORD - Query result record
    Record(RecordMessage),
    /// FAILURE - Operation failed
    Failure(FailureMessage),
    /// IGNORED - Message was ignored (connection in FAILED state)
    Ignored,
}

impl BoltResponse {
    /// Get the message tag.
    pub fn tag(&self) -> u8 {
        match self {
            BoltResponse::Success(_) => tag::SUCCESS,
            BoltResponse::Record(_) => tag::RECORD,
            BoltResponse::Failure(_) => tag::FAILURE,
            BoltResponse::Ignored => tag::IGNORED,
        }
    }

    /// Get message name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            BoltResponse::Success(_) => "SUCCESS",
            BoltResponse::Record(_) => "RECORD",
            BoltResponse::Failure(_) => "FAILURE",
            BoltResponse::Ignored => "IGNORED",
        }
    }

    /// Check if this is a success response.
    pub fn is_success(&self) -> bool {
        matches!(self, BoltResponse::Success(_))
    }

    /// Check if this is a failure response.
    pub fn is_failure(&self) -> bool {
        matches!(self, BoltResponse::Failure(_))
    }

    /// Check if this is a record response.
    pub fn is_record(&self) -> bool {
        matches!(self, BoltResponse::Record(_))
    }

    /// Whether this response ends the exchange for one request.
    pub fn is_summary(&self) -> bool {
        !self.is_record()
    }

    /// Convert to PackStream structure.
    pub fn to_structure(&self) -> PackStreamStructure {
        match self {
            BoltResponse::Success(msg) => msg.to_structure(),
            BoltResponse::Record(msg) => msg.to_structure(),
            BoltResponse::Failure(msg) => msg.to_structure(),
            BoltResponse::Ignored => PackStreamStructure::new(tag::IGNORED, vec![]),
        }
    }
}

fn single_field<'s>(s: &'s PackStreamStructure, name: &str) -> BoltResult<&'s PackStreamValue> {
    match s.fields.as_slice() {
        [only] => Ok(only),
        fields => Err(BoltError::protocol(format!(
            "{} must have 1 field, got {}",
            name,
            fields.len()
        ))),
    }
}

/// SUCCESS message - Operation completed successfully.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuccessMessage {
    /// Response metadata
    pub metadata: Metadata,
}

impl SuccessMessage {
    /// Create a new SUCCESS message with empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a SUCCESS message with metadata.
    pub fn with_metadata(metadata: Metadata) -> Self {
        Self { metadata }
    }

    /// Add metadata entry.
    pub fn add(&mut self, key: &str, value: impl Into<PackStreamValue>) {
        self.metadata.insert(key.to_string(), value.into());
    }

    /// Get metadata entry.
    pub fn get(&self, key: &str) -> Option<&PackStreamValue> {
        self.metadata.get(key)
    }

    /// Convert to PackStream structure.
    pub fn to_structure(&self) -> PackStreamStructure {
        PackStreamStructure::new(tag::SUCCESS, vec![PackStreamValue::Map(self.metadata.clone())])
    }

    /// Parse from PackStream structure.
    pub fn from_structure(s: &PackStreamStructure) -> BoltResult<Self> {
        let metadata = single_field(s, "SUCCESS")?
            .as_map()
            .ok_or_else(|| BoltError::protocol("SUCCESS metadata must be a map"))?
            .clone();
        Ok(Self { metadata })
    }
}

/// RECORD message - Query result record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordMessage {
    /// Field values
    pub fields: Vec<PackStreamValue>,
}

impl RecordMessage {
    /// Create a new RECORD message.
    pub fn new(fields: Vec<PackStreamValue>) -> Self {
        Self { fields }
    }

    /// Get field count.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if record is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Get field at index.
    pub fn get(&self, index: usize) -> Option<&PackStreamValue> {
        self.fields.get(index)
    }

    /// Convert to PackStream structure.
    pub fn to_structure(&self) -> PackStreamStructure {
        PackStreamStructure::new(tag::RECORD, vec![PackStreamValue::List(self.fields.clone())])
    }

    /// Parse from PackStream structure.
    pub fn from_structure(s: &PackStreamStructure) -> BoltResult<Self> {
        let fields = single_field(s, "RECORD")?
            .as_list()
            .ok_or_else(|| BoltError::protocol("RECORD fields must be a list"))?
            .to_vec();
        Ok(Self { fields })
    }
}

/// FAILURE message - Operation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureMessage {
    /// Server error code
    pub code: String,
    /// Error message
    pub message: String,
}

impl FailureMessage {
    /// Create a new FAILURE message.
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    /// Classification segment of the code ("ClientError", "TransientError", ...).
    pub fn classification(&self) -> &str {
        self.code.split('.').nth(1).unwrap_or("Unknown")
    }

    /// Category segment of the code ("Security", "Transaction", ...).
    pub fn category(&self) -> &str {
        self.code.split('.').nth(2).unwrap_or("Unknown")
    }

    /// Check if this is a client error.
    pub fn is_client_error(&self) -> bool {
        self.classification() == "ClientError"
    }

    /// Check if this is a transient error.
    ///
    /// `Terminated` and `LockClientStopped` are reported as transient but
    /// are caused by the client, so retrying them is pointless.
    pub fn is_transient(&self) -> bool {
        self.code.starts_with(BoltErrorCode::TRANSIENT_PREFIX)
            && self.code != BoltErrorCode::TERMINATED
            && self.code != BoltErrorCode::LOCK_CLIENT_STOPPED
    }

    /// Check if this is a database error.
    pub fn is_database_error(&self) -> bool {
        self.classification() == "DatabaseError"
    }

    /// Authentication or authorization failure.
    pub fn is_security_error(&self) -> bool {
        self.code.starts_with(BoltErrorCode::SECURITY_PREFIX)
    }

    /// Bookmark the server does not accept.
    pub fn is_invalid_bookmark(&self) -> bool {
        self.code == BoltErrorCode::INVALID_BOOKMARK
            || self.code == BoltErrorCode::INVALID_BOOKMARK_MIXTURE
    }

    /// Requested database does not exist.
    pub fn is_database_not_found(&self) -> bool {
        self.code == BoltErrorCode::DATABASE_NOT_FOUND
    }

    /// The contacted member cannot take writes any more.
    pub fn is_not_a_leader(&self) -> bool {
        self.code == BoltErrorCode::NOT_A_LEADER || self.code == BoltErrorCode::FORBIDDEN_ON_READ_ONLY
    }

    /// Asking another router would fail the same way.
    pub fn stops_route_discovery(&self) -> bool {
        self.is_security_error() || self.is_invalid_bookmark() || self.is_database_not_found()
    }

    /// Convert to PackStream structure.
    pub fn to_structure(&self) -> PackStreamStructure {
        let mut metadata = HashMap::new();
        metadata.insert("code".to_string(), PackStreamValue::String(self.code.clone()));
        metadata.insert("message".to_string(), PackStreamValue::String(self.message.clone()));

        PackStreamStructure::new(tag::FAILURE, vec![PackStreamValue::Map(metadata)])
    }

    /// Parse from PackStream structure.
    pub fn from_structure(s: &PackStreamStructure) -> BoltResult<Self> {
        let metadata = single_field(s, "FAILURE")?
            .as_map()
            .ok_or_else(|| BoltError::protocol("FAILURE metadata must be a map"))?;

        let text = |key: &str| {
            metadata
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| BoltError::protocol(format!("FAILURE requires a string '{}'", key)))
        };

        Ok(Self {
            code: text("code")?,
            message: text("message")?,
        })
    }
}

impl std::fmt::Display for FailureMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}
