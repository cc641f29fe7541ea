//! Per-version message catalogs.
//!
//! A catalog fixes, for one negotiated protocol version, which requests may
//! be sent and how each is laid out, which responses may arrive, and which
//! value structures may appear inside them. Catalogs are built once and
//! shared as `&'static` references.

use std::fmt;
use std::sync::OnceLock;

use bytes::BytesMut;

use super::error::{BoltError, BoltResult};
use super::handshake::BoltVersion;
use super::message::{
    tag, BoltRequest, BoltResponse, FailureMessage, MessageType, RecordMessage, SuccessMessage,
};
use super::packstream::marker;
use super::packstream::{
    PackStreamDecoder, PackStreamEncoder, PackStreamError, PackStreamStructure, PackStreamValue,
    StructRegistry, StructShape,
};

/// Lays a request out as a structure for the given version.
pub type SerializeFn = fn(&BoltRequest, BoltVersion) -> BoltResult<PackStreamStructure>;

/// Turns a received structure into a response.
pub type DeserializeFn = fn(&PackStreamStructure) -> BoltResult<BoltResponse>;

/// How one request kind is written.
#[derive(Clone, Copy)]
pub struct RequestEntry {
    /// Message kind
    pub message: MessageType,
    /// Structure tag
    pub tag: u8,
    /// Name for logging
    pub name: &'static str,
    /// Field count
    pub fields: usize,
    /// Serializer
    pub serialize: SerializeFn,
}

/// How one response kind is read.
#[derive(Clone, Copy)]
pub struct ResponseEntry {
    /// Structure tag
    pub tag: u8,
    /// Name for logging
    pub name: &'static str,
    /// Field count
    pub fields: usize,
    /// Deserializer
    pub deserialize: DeserializeFn,
}

impl fmt::Debug for RequestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestEntry")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("fields", &self.fields)
            .finish()
    }
}

impl fmt::Debug for ResponseEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseEntry")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Messages and value structures valid for one protocol version.
#[derive(Debug)]
pub struct MessageCatalog {
    version: BoltVersion,
    utc_date_time: bool,
    requests: Vec<RequestEntry>,
    responses: Vec<ResponseEntry>,
    value_structs: Vec<(u8, StructShape)>,
}

static CATALOGS: OnceLock<Vec<MessageCatalog>> = OnceLock::new();

fn catalogs() -> &'static [MessageCatalog] {
    CATALOGS.get_or_init(|| {
        let mut all = Vec::new();
        for version in BoltVersion::ALL {
            all.push(MessageCatalog::build(version, version.uses_utc_date_time()));
            if version.supports_utc_patch() {
                all.push(MessageCatalog::build(version, true));
            }
        }
        all
    })
}

fn wrong_request(request: &BoltRequest, expected: MessageType) -> BoltError {
    BoltError::protocol(format!(
        "{} serializer called with {}",
        expected.name(),
        request.name()
    ))
}

fn serialize_hello(request: &BoltRequest, version: BoltVersion) -> BoltResult<PackStreamStructure> {
    match request {
        BoltRequest::Hello(msg) => msg.to_structure(version),
        other => Err(wrong_request(other, MessageType::Hello)),
    }
}

fn serialize_hello_utc_patch(request: &BoltRequest, version: BoltVersion) -> BoltResult<PackStreamStructure> {
    match request {
        BoltRequest::Hello(msg) => msg.clone().with_patch("utc").to_structure(version),
        other => Err(wrong_request(other, MessageType::Hello)),
    }
}

fn serialize_run(request: &BoltRequest, version: BoltVersion) -> BoltResult<PackStreamStructure> {
    match request {
        BoltRequest::Run(msg) => msg.to_structure(version),
        other => Err(wrong_request(other, MessageType::Run)),
    }
}

fn serialize_begin(request: &BoltRequest, version: BoltVersion) -> BoltResult<PackStreamStructure> {
    match request {
        BoltRequest::Begin(msg) => msg.to_structure(version),
        other => Err(wrong_request(other, MessageType::Begin)),
    }
}

fn serialize_pull(request: &BoltRequest, _: BoltVersion) -> BoltResult<PackStreamStructure> {
    match request {
        BoltRequest::Pull(msg) => Ok(msg.to_structure()),
        other => Err(wrong_request(other, MessageType::Pull)),
    }
}

fn serialize_discard(request: &BoltRequest, _: BoltVersion) -> BoltResult<PackStreamStructure> {
    match request {
        BoltRequest::Discard(msg) => Ok(msg.to_structure()),
        other => Err(wrong_request(other, MessageType::Discard)),
    }
}

fn serialize_route(request: &BoltRequest, version: BoltVersion) -> BoltResult<PackStreamStructure> {
    match request {
        BoltRequest::Route(msg) => msg.to_structure(version),
        other => Err(wrong_request(other, MessageType::Route)),
    }
}

fn serialize_logon(request: &BoltRequest, _: BoltVersion) -> BoltResult<PackStreamStructure> {
    match request {
        BoltRequest::Logon(msg) => Ok(msg.to_structure()),
        other => Err(wrong_request(other, MessageType::Logon)),
    }
}

fn serialize_telemetry(request: &BoltRequest, _: BoltVersion) -> BoltResult<PackStreamStructure> {
    match request {
        BoltRequest::Telemetry(msg) => Ok(msg.to_structure()),
        other => Err(wrong_request(other, MessageType::Telemetry)),
    }
}

fn serialize_empty(request: &BoltRequest, _: BoltVersion) -> BoltResult<PackStreamStructure> {
    match request {
        BoltRequest::Goodbye
        | BoltRequest::Reset
        | BoltRequest::Commit
        | BoltRequest::Rollback
        | BoltRequest::Logoff => Ok(PackStreamStructure::new(request.tag(), vec![])),
        other => Err(BoltError::protocol(format!("{} is not a field-less message", other.name()))),
    }
}

fn deserialize_success(s: &PackStreamStructure) -> BoltResult<BoltResponse> {
    SuccessMessage::from_structure(s).map(BoltResponse::Success)
}

fn deserialize_record(s: &PackStreamStructure) -> BoltResult<BoltResponse> {
    RecordMessage::from_structure(s).map(BoltResponse::Record)
}

fn deserialize_ignored(_: &PackStreamStructure) -> BoltResult<BoltResponse> {
    Ok(BoltResponse::Ignored)
}

fn deserialize_failure(s: &PackStreamStructure) -> BoltResult<BoltResponse> {
    FailureMessage::from_structure(s).map(BoltResponse::Failure)
}

fn request(message: MessageType, fields: usize, serialize: SerializeFn) -> RequestEntry {
    RequestEntry {
        message,
        tag: message.tag(),
        name: message.name(),
        fields,
        serialize,
    }
}

impl MessageCatalog {
    fn build(version: BoltVersion, utc_date_time: bool) -> Self {
        let hello: SerializeFn = if utc_date_time && version.supports_utc_patch() {
            serialize_hello_utc_patch
        } else {
            serialize_hello
        };

        let mut requests = vec![
            request(MessageType::Hello, 1, hello),
            request(MessageType::Goodbye, 0, serialize_empty),
            request(MessageType::Reset, 0, serialize_empty),
            request(MessageType::Run, 3, serialize_run),
            request(MessageType::Begin, 1, serialize_begin),
            request(MessageType::Commit, 0, serialize_empty),
            request(MessageType::Rollback, 0, serialize_empty),
            request(MessageType::Discard, 1, serialize_discard),
            request(MessageType::Pull, 1, serialize_pull),
        ];
        if version.supports_route() {
            requests.push(request(MessageType::Route, 3, serialize_route));
        }
        if version.supports_logon() {
            requests.push(request(MessageType::Logon, 1, serialize_logon));
            requests.push(request(MessageType::Logoff, 0, serialize_empty));
        }
        if version.supports_telemetry() {
            requests.push(request(MessageType::Telemetry, 1, serialize_telemetry));
        }

        let responses = vec![
            ResponseEntry {
                tag: tag::SUCCESS,
                name: "SUCCESS",
                fields: 1,
                deserialize: deserialize_success,
            },
            ResponseEntry {
                tag: tag::RECORD,
                name: "RECORD",
                fields: 1,
                deserialize: deserialize_record,
            },
            ResponseEntry {
                tag: tag::IGNORED,
                name: "IGNORED",
                fields: 0,
                deserialize: deserialize_ignored,
            },
            ResponseEntry {
                tag: tag::FAILURE,
                name: "FAILURE",
                fields: 1,
                deserialize: deserialize_failure,
            },
        ];

        let (node, relationship, unbound) = if version.uses_element_ids() {
            (4, 8, 4)
        } else {
            (3, 5, 3)
        };
        let (date_time, date_time_zone_id) = if utc_date_time {
            (marker::DATE_TIME, marker::DATE_TIME_ZONE_ID)
        } else {
            (marker::LEGACY_DATE_TIME, marker::LEGACY_DATE_TIME_ZONE_ID)
        };
        let value_structs = vec![
            (marker::NODE, StructShape::exact(node)),
            (marker::RELATIONSHIP, StructShape::exact(relationship)),
            (marker::UNBOUND_RELATIONSHIP, StructShape::exact(unbound)),
            (marker::PATH, StructShape::exact(3)),
            (marker::POINT_2D, StructShape::exact(3)),
            (marker::POINT_3D, StructShape::exact(4)),
            (marker::DATE, StructShape::exact(1)),
            (marker::TIME, StructShape::exact(2)),
            (marker::LOCAL_TIME, StructShape::exact(1)),
            (marker::LOCAL_DATE_TIME, StructShape::exact(2)),
            (date_time, StructShape::exact(3)),
            (date_time_zone_id, StructShape::exact(3)),
            (marker::DURATION, StructShape::exact(4)),
        ];

        Self {
            version,
            utc_date_time,
            requests,
            responses,
            value_structs,
        }
    }

    /// Catalog for `version` without protocol patches.
    pub fn for_version(version: BoltVersion) -> &'static MessageCatalog {
        Self::for_negotiated(version, false)
    }

    /// Catalog for `version`, honoring an accepted "utc" patch on 4.3/4.4.
    pub fn for_negotiated(version: BoltVersion, utc_patch: bool) -> &'static MessageCatalog {
        let utc = version.uses_utc_date_time() || (utc_patch && version.supports_utc_patch());
        let all = catalogs();
        let found = all
            .iter()
            .find(|c| c.version == version && c.utc_date_time == utc);
        // Every (version, utc) pair reachable here is built in `catalogs()`.
        match found {
            Some(catalog) => catalog,
            None => &all[0],
        }
    }

    /// Catalog that asks 4.3/4.4 servers for UTC date-times in HELLO.
    ///
    /// Used before the server's answer is known; once the HELLO SUCCESS
    /// arrives switch with [`MessageCatalog::for_negotiated`].
    pub fn proposing_utc_patch(version: BoltVersion) -> &'static MessageCatalog {
        Self::for_negotiated(version, true)
    }

    /// Protocol version.
    pub fn version(&self) -> BoltVersion {
        self.version
    }

    /// Whether date-times use the UTC layout.
    pub fn utc_date_time(&self) -> bool {
        self.utc_date_time
    }

    /// Request kinds this version accepts.
    pub fn supported_requests(&self) -> impl Iterator<Item = MessageType> + '_ {
        self.requests.iter().map(|e| e.message)
    }

    /// Entry for a request kind.
    pub fn request_entry(&self, message: MessageType) -> BoltResult<&RequestEntry> {
        self.requests
            .iter()
            .find(|e| e.message == message)
            .ok_or(BoltError::UnsupportedByProtocolVersion {
                message: message.name(),
                version: self.version,
            })
    }

    /// Entry for a response tag.
    pub fn response_entry(&self, tag: u8) -> BoltResult<&ResponseEntry> {
        self.responses
            .iter()
            .find(|e| e.tag == tag)
            .ok_or(BoltError::PackStream(PackStreamError::StructTagMismatch { tag }))
    }

    /// Shape of a value structure, if `tag` is valid in this version.
    pub fn value_struct(&self, tag: u8) -> Option<StructShape> {
        self.value_structs
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, shape)| *shape)
    }

    /// Lay out a request as a structure.
    pub fn to_structure(&self, request: &BoltRequest) -> BoltResult<PackStreamStructure> {
        let entry = self.request_entry(request.message_type())?;
        let structure = (entry.serialize)(request, self.version)?;
        if structure.len() != entry.fields {
            return Err(BoltError::protocol(format!(
                "{} laid out with {} fields, expected {}",
                entry.name,
                structure.len(),
                entry.fields
            )));
        }
        Ok(structure)
    }

    /// Encode a request to PackStream bytes (unchunked).
    pub fn encode_message(&self, request: &BoltRequest) -> BoltResult<BytesMut> {
        let structure = self.to_structure(request)?;
        let mut encoder = PackStreamEncoder::new();
        encoder.encode_structure(&structure)?;
        Ok(encoder.into_bytes())
    }

    /// Decode one complete (de-chunked) response message.
    pub fn decode_message(&self, data: &[u8]) -> BoltResult<BoltResponse> {
        let envelope = ResponseTags(self);
        let mut decoder = PackStreamDecoder::with_registry(data, self).with_envelope(&envelope);
        let value = decoder.decode()?;
        if !decoder.is_empty() {
            return Err(PackStreamError::MalformedStream(format!(
                "{} trailing bytes after message",
                decoder.remaining()
            ))
            .into());
        }
        match value {
            PackStreamValue::Structure(s) => {
                let entry = self.response_entry(s.tag)?;
                (entry.deserialize)(&s)
            }
            other => Err(BoltError::protocol(format!(
                "expected a message structure, got {}",
                other.type_name()
            ))),
        }
    }
}

/// Values nested anywhere in a message: graph, temporal and spatial structs.
impl StructRegistry for MessageCatalog {
    fn struct_shape(&self, tag: u8) -> Option<StructShape> {
        self.value_struct(tag)
    }
}

/// Response messages, accepted only as the outermost structure.
struct ResponseTags<'a>(&'a MessageCatalog);

impl StructRegistry for ResponseTags<'_> {
    fn struct_shape(&self, tag: u8) -> Option<StructShape> {
        self.0
            .responses
            .iter()
            .find(|e| e.tag == tag)
            .map(|e| StructShape::exact(e.fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bolt::message::{HelloMessage, PullMessage, RouteMessage};
    use crate::bolt::packstream::{encode, Metadata, PackStreamNode};

    fn encoded(s: PackStreamStructure) -> Vec<u8> {
        encode(&PackStreamValue::Structure(s)).unwrap().to_vec()
    }

    #[test]
    fn test_catalogs_are_shared() {
        let a = MessageCatalog::for_version(BoltVersion::V4_4);
        let b = MessageCatalog::for_version(BoltVersion::V4_4);
        assert!(std::ptr::eq(a, b));
        assert_eq!(a.version(), BoltVersion::V4_4);
        assert!(!a.utc_date_time());
        assert!(MessageCatalog::for_negotiated(BoltVersion::V4_4, true).utc_date_time());
        // The patch has no meaning for 4.2.
        assert!(!MessageCatalog::for_negotiated(BoltVersion::V4_2, true).utc_date_time());
        assert!(MessageCatalog::for_version(BoltVersion::V5_0).utc_date_time());
    }

    #[test]
    fn test_route_unsupported_before_4_3() {
        let catalog = MessageCatalog::for_version(BoltVersion::V4_2);
        let err = catalog
            .encode_message(&BoltRequest::Route(RouteMessage::new()))
            .unwrap_err();
        assert!(matches!(
            err,
            BoltError::UnsupportedByProtocolVersion { message: "ROUTE", version: BoltVersion::V4_2 }
        ));
    }

    #[test]
    fn test_version_gated_requests() {
        let v50: Vec<_> = MessageCatalog::for_version(BoltVersion::V5_0).supported_requests().collect();
        assert!(v50.contains(&MessageType::Route));
        assert!(!v50.contains(&MessageType::Logon));

        let v51 = MessageCatalog::for_version(BoltVersion::V5_1);
        assert!(v51.request_entry(MessageType::Logoff).is_ok());
        assert!(v51.request_entry(MessageType::Telemetry).is_err());

        let v54 = MessageCatalog::for_version(BoltVersion::V5_4);
        assert_eq!(v54.request_entry(MessageType::Telemetry).unwrap().tag, 0x54);
    }

    #[test]
    fn test_encode_pull_bytes() {
        let bytes = MessageCatalog::for_version(BoltVersion::V4_4)
            .encode_message(&BoltRequest::Pull(PullMessage::all()))
            .unwrap();
        // B1 3F A1 81 'n' FF
        assert_eq!(&bytes[..], &[0xB1, 0x3F, 0xA1, 0x81, b'n', 0xFF]);
    }

    #[test]
    fn test_encode_goodbye() {
        let bytes = MessageCatalog::for_version(BoltVersion::V4_0)
            .encode_message(&BoltRequest::Goodbye)
            .unwrap();
        assert_eq!(&bytes[..], &[0xB0, 0x02]);
    }

    #[test]
    fn test_utc_catalog_patches_hello() {
        let hello = BoltRequest::Hello(HelloMessage::new("ua"));
        let patched = MessageCatalog::proposing_utc_patch(BoltVersion::V4_4)
            .to_structure(&hello)
            .unwrap();
        let extra = patched.fields[0].as_map().unwrap();
        assert_eq!(
            extra.get("patch_bolt").and_then(|v| v.as_string_list()),
            Some(vec!["utc".to_string()])
        );

        let plain = MessageCatalog::for_version(BoltVersion::V4_4)
            .to_structure(&hello)
            .unwrap();
        assert!(!plain.fields[0].as_map().unwrap().contains_key("patch_bolt"));
    }

    #[test]
    fn test_decode_success() {
        let mut meta = Metadata::new();
        meta.insert("server".into(), "Neo4j/4.4.0".into());
        let bytes = encoded(SuccessMessage::with_metadata(meta.clone()).to_structure());

        let response = MessageCatalog::for_version(BoltVersion::V4_4)
            .decode_message(&bytes)
            .unwrap();
        assert_eq!(response, BoltResponse::Success(SuccessMessage::with_metadata(meta)));
    }

    #[test]
    fn test_decode_ignored() {
        let response = MessageCatalog::for_version(BoltVersion::V5_0)
            .decode_message(&[0xB0, 0x7E])
            .unwrap();
        assert_eq!(response, BoltResponse::Ignored);
    }

    #[test]
    fn test_record_node_layout_per_version() {
        let node = PackStreamNode::new(1, vec!["A".into()], Metadata::new());
        let v5_record = encoded(RecordMessage::new(vec![node.to_value(BoltVersion::V5_0)]).to_structure());
        let v4_record = encoded(RecordMessage::new(vec![node.to_value(BoltVersion::V4_4)]).to_structure());

        assert!(MessageCatalog::for_version(BoltVersion::V5_0).decode_message(&v5_record).is_ok());
        assert!(MessageCatalog::for_version(BoltVersion::V4_4).decode_message(&v4_record).is_ok());

        // A 3-field node on a 5.0 connection is malformed, never defaulted.
        let err = MessageCatalog::for_version(BoltVersion::V5_0)
            .decode_message(&v4_record)
            .unwrap_err();
        assert!(matches!(err, BoltError::PackStream(PackStreamError::MalformedStream(_))));
    }

    #[test]
    fn test_date_time_tags_follow_catalog() {
        let utc = PackStreamStructure::new(marker::DATE_TIME, vec![0.into(), 0.into(), 0.into()]);
        let record = encoded(RecordMessage::new(vec![PackStreamValue::Structure(utc)]).to_structure());

        let err = MessageCatalog::for_version(BoltVersion::V4_4)
            .decode_message(&record)
            .unwrap_err();
        assert!(matches!(
            err,
            BoltError::PackStream(PackStreamError::StructTagMismatch { tag: marker::DATE_TIME })
        ));
        assert!(MessageCatalog::for_negotiated(BoltVersion::V4_4, true)
            .decode_message(&record)
            .is_ok());
    }

    #[test]
    fn test_unknown_message_tag() {
        let err = MessageCatalog::for_version(BoltVersion::V4_4)
            .decode_message(&[0xB0, 0x01])
            .unwrap_err();
        assert!(matches!(
            err,
            BoltError::PackStream(PackStreamError::StructTagMismatch { tag: 0x01 })
        ));
    }

    #[test]
    fn test_response_tag_rejected_inside_record() {
        let nested = SuccessMessage::new().to_structure();
        let record = encoded(RecordMessage::new(vec![PackStreamValue::Structure(nested)]).to_structure());

        let err = MessageCatalog::for_version(BoltVersion::V5_4)
            .decode_message(&record)
            .unwrap_err();
        assert!(matches!(
            err,
            BoltError::PackStream(PackStreamError::StructTagMismatch { tag: tag::SUCCESS })
        ));
    }

    #[test]
    fn test_value_struct_rejected_as_message() {
        let node = PackStreamNode::new(1, vec!["A".into()], Metadata::new());
        let bytes = encode(&node.to_value(BoltVersion::V5_0)).unwrap();

        let err = MessageCatalog::for_version(BoltVersion::V5_0)
            .decode_message(&bytes)
            .unwrap_err();
        assert!(matches!(
            err,
            BoltError::PackStream(PackStreamError::StructTagMismatch { .. })
        ));
    }

    #[test]
    fn test_non_structure_message() {
        let err = MessageCatalog::for_version(BoltVersion::V4_4)
            .decode_message(&[0x01])
            .unwrap_err();
        assert!(matches!(err, BoltError::Protocol(_)));
    }

    #[test]
    fn test_trailing_bytes() {
        let err = MessageCatalog::for_version(BoltVersion::V4_4)
            .decode_message(&[0xB0, 0x7E, 0x00])
            .unwrap_err();
        assert!(matches!(err, BoltError::PackStream(PackStreamError::MalformedStream(_))));
    }
}
