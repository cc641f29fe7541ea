//! Bolt protocol channel for client-side use.
//!
//! Handles handshake, message framing and pipelined request/response
//! exchange over any byte stream.

use std::future::Future;
use std::io;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::bolt::codec::DEFAULT_MAX_MESSAGE_SIZE;
use crate::bolt::handshake::HANDSHAKE_RESPONSE_SIZE;
use crate::bolt::{
    AuthToken, BoltClientCodec, BoltError, BoltRequest, BoltResponse, BoltResult, BoltVersion,
    Handshake, HandshakeError, HelloMessage, LogonMessage, MessageCatalog, PackStreamValue,
    RouteMessage,
};

use super::super::address::ServerAddress;
use super::super::error::{DriverError, DriverResult};
use super::super::response::{
    ResponseHandler, ResponsePipeline, RoutingTableCollector, ServerInfo, ServerInfoCollector,
};
use super::super::routing::{RouteRequest, RoutingInfo};

/// Bolt channel state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Stream open, not handshaked
    Connected,
    /// Handshake completed
    Ready,
    /// A codec or transport error left the stream unusable
    Defunct,
    /// Closed
    Closed,
}

/// Client-side Bolt channel.
///
/// The message catalog is pinned at handshake. The only later change is the
/// switch to UTC date-times once a 4.3/4.4 server accepts that patch in its
/// HELLO reply.
pub struct BoltChannel<S> {
    /// Byte stream
    stream: S,
    /// Server address
    address: ServerAddress,
    /// Codec for the negotiated version
    codec: Option<BoltClientCodec>,
    /// Read buffer
    read_buffer: BytesMut,
    /// Write buffer
    write_buffer: BytesMut,
    /// Channel state
    state: ChannelState,
    /// Deadline for any single read or write
    io_timeout: Option<Duration>,
    /// Inbound message size limit
    max_message_size: usize,
}

impl<S> BoltChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an open stream.
    pub fn new(stream: S, address: ServerAddress) -> Self {
        Self {
            stream,
            address,
            codec: None,
            read_buffer: BytesMut::with_capacity(8192),
            write_buffer: BytesMut::with_capacity(8192),
            state: ChannelState::Connected,
            io_timeout: None,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }

    /// Limit the size of one message.
    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    /// Fail any single read or write that takes longer than `timeout`.
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = Some(timeout);
        self
    }

    /// Perform the version handshake and pin the matching catalog.
    ///
    /// With `utc_patch` set, 4.3/4.4 get a catalog whose HELLO asks for
    /// the "utc" patch.
    pub async fn handshake(
        &mut self,
        handshake: &Handshake,
        utc_patch: bool,
    ) -> BoltResult<BoltVersion> {
        if self.state != ChannelState::Connected {
            return Err(BoltError::protocol(format!(
                "Cannot handshake in state {:?}",
                self.state
            )));
        }

        let request = handshake.request();
        let mut reply = [0u8; HANDSHAKE_RESPONSE_SIZE];
        let exchanged = {
            let stream = &mut self.stream;
            let reply = &mut reply;
            with_timeout(self.io_timeout, async move {
                stream.write_all(&request).await?;
                stream.flush().await?;
                stream.read_exact(reply).await?;
                Ok::<(), io::Error>(())
            })
            .await
        };

        let version = match exchanged {
            Ok(()) => handshake.parse_response(reply),
            Err(BoltError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(HandshakeError::ConnectionClosed)
            }
            Err(BoltError::Timeout) => Err(HandshakeError::Timeout),
            Err(other) => {
                self.state = ChannelState::Defunct;
                return Err(other);
            }
        };
        let version = match version {
            Ok(version) => version,
            Err(err) => {
                self.state = ChannelState::Defunct;
                return Err(err.into());
            }
        };

        let catalog = if utc_patch && version.supports_utc_patch() {
            MessageCatalog::proposing_utc_patch(version)
        } else {
            MessageCatalog::for_version(version)
        };
        self.codec = Some(BoltClientCodec::with_max_size(catalog, self.max_message_size));
        self.state = ChannelState::Ready;
        debug!("[{}] Negotiated Bolt {}", self.address, version);

        Ok(version)
    }

    /// Initialize the session: HELLO, followed by LOGON from Bolt 5.1.
    pub async fn hello(&mut self, hello: HelloMessage, auth: AuthToken) -> DriverResult<ServerInfo> {
        let version = self.require_version()?;

        let hello_handler = ResponseHandler::new("HELLO").with_collector(ServerInfoCollector);
        let requests = if version.supports_logon() {
            vec![
                (BoltRequest::Hello(hello), hello_handler),
                (
                    BoltRequest::Logon(LogonMessage::new(auth)),
                    ResponseHandler::new("LOGON"),
                ),
            ]
        } else {
            vec![(BoltRequest::Hello(hello.with_auth(auth)), hello_handler)]
        };

        let mut handlers = self.run_pipeline(requests).await?.into_iter();
        let mut hello = handlers
            .next()
            .ok_or_else(|| BoltError::protocol("no response to HELLO"))?;
        hello.result()?;
        for handler in handlers {
            handler.result()?;
        }

        let info = hello.take::<ServerInfoCollector>().unwrap_or_default();
        if version.supports_utc_patch() {
            let accepted = info.has_patch("utc");
            if let Some(codec) = self.codec.as_mut() {
                codec.set_catalog(MessageCatalog::for_negotiated(version, accepted));
            }
            debug!("[{}] utc patch accepted: {}", self.address, accepted);
        }

        Ok(info)
    }

    /// Send requests back to back, then read until each one is answered.
    ///
    /// Handlers come back in request order.
    pub async fn run_pipeline(
        &mut self,
        requests: Vec<(BoltRequest, ResponseHandler)>,
    ) -> DriverResult<Vec<ResponseHandler>> {
        let mut pipeline = ResponsePipeline::new();
        for (request, handler) in requests {
            if let Err(err) = self.queue(&request) {
                self.write_buffer.clear();
                return Err(err.into());
            }
            debug!("[{}] C: {}", self.address, request.name());
            pipeline.enqueue(handler);
        }
        self.flush().await?;

        let mut done = Vec::with_capacity(pipeline.len());
        while !pipeline.is_empty() {
            let response = self.recv().await?;
            match pipeline.on_response(response) {
                Ok(Some(handler)) => done.push(handler),
                Ok(None) => {}
                Err(err) => {
                    // client and server no longer agree on the stream
                    self.state = ChannelState::Defunct;
                    return Err(err);
                }
            }
        }
        Ok(done)
    }

    /// Ask this server for a routing table.
    pub async fn route(&mut self, request: &RouteRequest) -> DriverResult<RoutingInfo> {
        let routing = request
            .routing_context
            .iter()
            .map(|(k, v)| (k.clone(), PackStreamValue::String(v.clone())))
            .collect();
        let mut message = RouteMessage::new()
            .with_routing(routing)
            .with_bookmarks(request.bookmarks.clone());
        if let Some(database) = request.database_name() {
            message = message.with_database(database);
        }
        if let Some(ref user) = request.imp_user {
            message = message.with_imp_user(user);
        }

        let handler = ResponseHandler::new("ROUTE").with_collector(RoutingTableCollector);
        let mut handlers = self
            .run_pipeline(vec![(BoltRequest::Route(message), handler)])
            .await?;
        let mut handler = handlers
            .pop()
            .ok_or_else(|| BoltError::protocol("no response to ROUTE"))?;
        handler.result()?;
        handler.take::<RoutingTableCollector>().ok_or_else(|| {
            DriverError::invalid_metadata("rt", "ROUTE succeeded without a routing table")
        })
    }

    /// Encode and send one request.
    pub async fn send(&mut self, request: &BoltRequest) -> BoltResult<()> {
        self.queue(request)?;
        debug!("[{}] C: {}", self.address, request.name());
        self.flush().await
    }

    /// Receive one response.
    pub async fn recv(&mut self) -> BoltResult<BoltResponse> {
        self.require_ready()?;

        loop {
            let decoded = match self.codec.as_mut() {
                Some(codec) => codec.decode(&mut self.read_buffer),
                None => return Err(BoltError::protocol("no protocol version negotiated")),
            };
            match decoded {
                Ok(Some(response)) => return Ok(response),
                Ok(None) => {}
                Err(err) => return self.fail(err),
            }

            let read = {
                let stream = &mut self.stream;
                let buffer = &mut self.read_buffer;
                with_timeout(self.io_timeout, stream.read_buf(buffer)).await
            };
            match read {
                Ok(0) => {
                    self.state = ChannelState::Closed;
                    return Err(BoltError::ConnectionClosed);
                }
                Ok(_) => {}
                Err(err) => return self.fail(err),
            }
        }
    }

    /// Send GOODBYE and shut the stream down.
    pub async fn close(&mut self) {
        if self.state == ChannelState::Ready {
            if let Err(e) = self.send(&BoltRequest::Goodbye).await {
                debug!("[{}] GOODBYE not delivered: {}", self.address, e);
            }
        }
        self.state = ChannelState::Closed;
        self.stream.shutdown().await.ok();
    }

    /// Negotiated protocol version.
    pub fn version(&self) -> Option<BoltVersion> {
        self.codec.as_ref().map(|c| c.catalog().version())
    }

    /// Catalog in use.
    pub fn catalog(&self) -> Option<&'static MessageCatalog> {
        self.codec.as_ref().map(|c| c.catalog())
    }

    /// Channel state.
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Server address.
    pub fn address(&self) -> &ServerAddress {
        &self.address
    }

    /// Check if the channel can exchange messages.
    pub fn is_ready(&self) -> bool {
        self.state == ChannelState::Ready
    }

    /// Encode into the write buffer. On error nothing has been appended.
    fn queue(&mut self, request: &BoltRequest) -> BoltResult<()> {
        self.require_ready()?;
        match self.codec.as_mut() {
            Some(codec) => codec.encode(request, &mut self.write_buffer),
            None => Err(BoltError::protocol("no protocol version negotiated")),
        }
    }

    async fn flush(&mut self) -> BoltResult<()> {
        let written = {
            let stream = &mut self.stream;
            let buffer = &self.write_buffer;
            with_timeout(self.io_timeout, async move {
                stream.write_all(buffer).await?;
                stream.flush().await
            })
            .await
        };
        self.write_buffer.clear();
        match written {
            Ok(()) => Ok(()),
            Err(err) => self.fail(err),
        }
    }

    fn require_ready(&self) -> BoltResult<()> {
        match self.state {
            ChannelState::Ready => Ok(()),
            ChannelState::Closed => Err(BoltError::ConnectionClosed),
            ChannelState::Defunct => Err(BoltError::protocol(format!(
                "connection to {} is defunct",
                self.address
            ))),
            ChannelState::Connected => Err(BoltError::protocol("handshake has not been performed")),
        }
    }

    fn require_version(&self) -> BoltResult<BoltVersion> {
        self.require_ready()?;
        self.version()
            .ok_or_else(|| BoltError::protocol("no protocol version negotiated"))
    }

    fn fail<T>(&mut self, err: BoltError) -> BoltResult<T> {
        if err.is_connection_fatal() {
            self.state = ChannelState::Defunct;
        }
        Err(err)
    }
}

async fn with_timeout<T, F>(timeout: Option<Duration>, fut: F) -> BoltResult<T>
where
    F: Future<Output = io::Result<T>>,
{
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result.map_err(BoltError::from),
            Err(_) => Err(BoltError::Timeout),
        },
        None => fut.await.map_err(BoltError::from),
    }
}

impl<S> std::fmt::Debug for BoltChannel<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoltChannel")
            .field("address", &self.address)
            .field("state", &self.state)
            .field("version", &self.codec.as_ref().map(|c| c.catalog().version()))
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::bolt::codec::write_chunked;
    use crate::bolt::message::tag;
    use crate::bolt::packstream::{decode, encode};
    use crate::bolt::{
        BoltErrorCode, ChunkCodec, FailureMessage, Metadata, PackStreamStructure, SuccessMessage,
    };
    use futures::StreamExt;
    use tokio::io::DuplexStream;
    use tokio::task::JoinHandle;
    use tokio_util::codec::FramedRead;

    /// Scripted server: answers the handshake with `version`, then for each
    /// step reads one request and writes the given responses.
    pub(crate) fn scripted_server<T>(
        stream: T,
        version: [u8; 4],
        script: Vec<Vec<BoltResponse>>,
    ) -> JoinHandle<Vec<PackStreamStructure>>
    where
        T: AsyncRead + AsyncWrite + Send + 'static,
    {
        tokio::spawn(async move {
            let (mut rd, mut wr) = tokio::io::split(stream);
            let mut handshake = [0u8; 20];
            rd.read_exact(&mut handshake).await.unwrap();
            wr.write_all(&version).await.unwrap();

            let mut frames = FramedRead::new(rd, ChunkCodec::new());
            let mut received = Vec::new();
            for responses in script {
                let frame = frames.next().await.unwrap().unwrap();
                match decode(&frame).unwrap() {
                    PackStreamValue::Structure(s) => received.push(s),
                    other => panic!("not a message: {:?}", other),
                }
                let mut out = BytesMut::new();
                for response in responses {
                    let body = encode(&PackStreamValue::Structure(response.to_structure())).unwrap();
                    write_chunked(&body, &mut out);
                }
                wr.write_all(&out).await.unwrap();
            }
            received
        })
    }

    pub(crate) fn success(entries: Vec<(&str, PackStreamValue)>) -> BoltResponse {
        let mut success = SuccessMessage::new();
        for (key, value) in entries {
            success.add(key, value);
        }
        BoltResponse::Success(success)
    }

    pub(crate) fn routing_reply(db: &str) -> BoltResponse {
        let server = |role: &str, address: &str| {
            let mut m = Metadata::new();
            m.insert("role".into(), role.into());
            m.insert("addresses".into(), PackStreamValue::string_list([address]));
            PackStreamValue::Map(m)
        };
        let mut rt = Metadata::new();
        rt.insert("ttl".into(), 300i64.into());
        rt.insert("db".into(), db.into());
        rt.insert(
            "servers".into(),
            PackStreamValue::List(vec![
                server("ROUTE", "r1:7687"),
                server("WRITE", "w1:7687"),
                server("READ", "rd1:7687"),
            ]),
        );
        success(vec![("rt", PackStreamValue::Map(rt))])
    }

    fn channel(stream: DuplexStream) -> BoltChannel<DuplexStream> {
        BoltChannel::new(stream, ServerAddress::new("db1", 7687))
    }

    fn extra(s: &PackStreamStructure) -> &Metadata {
        s.fields[0].as_map().unwrap()
    }

    #[tokio::test]
    async fn test_handshake_pins_version() {
        let (client, server) = tokio::io::duplex(4096);
        let server = scripted_server(server, [0, 0, 4, 5], vec![]);

        let mut channel = channel(client);
        assert_eq!(channel.state(), ChannelState::Connected);
        let version = channel.handshake(&Handshake::new(), true).await.unwrap();

        assert_eq!(version, BoltVersion::V5_4);
        assert!(channel.is_ready());
        assert_eq!(channel.version(), Some(BoltVersion::V5_4));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_handshake_rejected() {
        let (client, server) = tokio::io::duplex(4096);
        let server = scripted_server(server, [0, 0, 0, 0], vec![]);

        let mut channel = channel(client);
        let err = channel.handshake(&Handshake::new(), false).await.unwrap_err();
        assert!(matches!(
            err,
            BoltError::Handshake(HandshakeError::NoCompatibleVersion)
        ));
        assert_eq!(channel.state(), ChannelState::Defunct);
        assert!(channel.send(&BoltRequest::Reset).await.is_err());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_handshake_server_closes() {
        let (client, mut server) = tokio::io::duplex(4096);
        let server = tokio::spawn(async move {
            let mut buf = [0u8; 20];
            server.read_exact(&mut buf).await.unwrap();
        });

        let mut channel = channel(client);
        let err = channel.handshake(&Handshake::new(), false).await.unwrap_err();
        assert!(matches!(
            err,
            BoltError::Handshake(HandshakeError::ConnectionClosed)
        ));
        server.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_handshake_timeout() {
        let (client, _server) = tokio::io::duplex(4096);
        let mut channel = channel(client).with_io_timeout(Duration::from_secs(5));
        let err = channel.handshake(&Handshake::new(), false).await.unwrap_err();
        assert!(matches!(err, BoltError::Handshake(HandshakeError::Timeout)));
        assert_eq!(channel.state(), ChannelState::Defunct);
    }

    #[tokio::test]
    async fn test_hello_with_utc_patch_on_4_4() {
        let (client, server) = tokio::io::duplex(4096);
        let server = scripted_server(
            server,
            [0, 0, 4, 4],
            vec![vec![success(vec![
                ("server", "Neo4j/4.4.0".into()),
                ("connection_id", "bolt-7".into()),
                ("patch_bolt", PackStreamValue::string_list(["utc"])),
            ])]],
        );

        let mut channel = channel(client);
        channel.handshake(&Handshake::new(), true).await.unwrap();
        let info = channel
            .hello(HelloMessage::new("test/1.0"), AuthToken::basic("neo4j", "pw"))
            .await
            .unwrap();

        assert_eq!(info.agent.as_deref(), Some("Neo4j/4.4.0"));
        assert_eq!(info.connection_id.as_deref(), Some("bolt-7"));
        assert!(channel.catalog().unwrap().utc_date_time());

        let received = server.await.unwrap();
        assert_eq!(received[0].tag, tag::HELLO);
        let hello = extra(&received[0]);
        assert_eq!(hello.get("scheme").and_then(|v| v.as_str()), Some("basic"));
        assert_eq!(
            hello.get("patch_bolt").and_then(|v| v.as_string_list()),
            Some(vec!["utc".to_string()])
        );
    }

    #[tokio::test]
    async fn test_hello_without_utc_acceptance() {
        let (client, server) = tokio::io::duplex(4096);
        let server = scripted_server(server, [0, 0, 3, 4], vec![vec![success(vec![])]]);

        let mut channel = channel(client);
        channel.handshake(&Handshake::new(), true).await.unwrap();
        let info = channel
            .hello(HelloMessage::new("test/1.0"), AuthToken::none())
            .await
            .unwrap();

        assert_eq!(info, ServerInfo::default());
        assert!(!channel.catalog().unwrap().utc_date_time());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_hello_then_logon_on_5_x() {
        let (client, server) = tokio::io::duplex(4096);
        let server = scripted_server(
            server,
            [0, 0, 4, 5],
            vec![
                vec![success(vec![("server", "Neo4j/5.20.0".into())])],
                vec![success(vec![])],
            ],
        );

        let mut channel = channel(client);
        channel.handshake(&Handshake::new(), true).await.unwrap();
        channel
            .hello(HelloMessage::new("test/1.0"), AuthToken::basic("neo4j", "pw"))
            .await
            .unwrap();

        let received = server.await.unwrap();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].tag, tag::HELLO);
        assert!(extra(&received[0]).get("scheme").is_none());
        assert!(extra(&received[0]).get("patch_bolt").is_none());
        assert_eq!(received[1].tag, tag::LOGON);
        assert_eq!(
            extra(&received[1]).get("principal").and_then(|v| v.as_str()),
            Some("neo4j")
        );
    }

    #[tokio::test]
    async fn test_hello_failure_surfaces_verbatim() {
        let (client, server) = tokio::io::duplex(4096);
        let failure = FailureMessage::new(BoltErrorCode::AUTHENTICATION_FAILED, "bad credentials");
        let server = scripted_server(
            server,
            [0, 0, 4, 5],
            vec![
                vec![BoltResponse::Failure(failure.clone())],
                vec![BoltResponse::Ignored],
            ],
        );

        let mut channel = channel(client);
        channel.handshake(&Handshake::new(), false).await.unwrap();
        let err = channel
            .hello(HelloMessage::new("test/1.0"), AuthToken::basic("neo4j", "wrong"))
            .await
            .unwrap_err();

        assert!(matches!(err, DriverError::Failure(ref f) if *f == failure));
        assert!(channel.is_ready());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_route_on_4_4() {
        let (client, server) = tokio::io::duplex(4096);
        let server = scripted_server(server, [0, 0, 4, 4], vec![vec![routing_reply("movies")]]);

        let mut channel = channel(client);
        channel.handshake(&Handshake::new(), false).await.unwrap();
        let mut context = std::collections::HashMap::new();
        context.insert("address".to_string(), "db1:7687".to_string());
        let request = RouteRequest::new("movies")
            .with_routing_context(context)
            .with_bookmarks(vec!["bm:1".into()]);
        let info = channel.route(&request).await.unwrap();

        assert_eq!(info.ttl, Duration::from_secs(300));
        assert_eq!(info.database.as_deref(), Some("movies"));
        assert_eq!(info.routers, vec![ServerAddress::new("r1", 7687)]);
        assert_eq!(info.writers, vec![ServerAddress::new("w1", 7687)]);
        assert_eq!(info.readers, vec![ServerAddress::new("rd1", 7687)]);

        let received = server.await.unwrap();
        let route = &received[0];
        assert_eq!(route.tag, tag::ROUTE);
        assert_eq!(route.fields.len(), 3);
        assert_eq!(
            route.fields[0]
                .as_map()
                .and_then(|m| m.get("address"))
                .and_then(|v| v.as_str()),
            Some("db1:7687")
        );
        assert_eq!(route.fields[1].as_string_list(), Some(vec!["bm:1".to_string()]));
        assert_eq!(
            route.fields[2]
                .as_map()
                .and_then(|m| m.get("db"))
                .and_then(|v| v.as_str()),
            Some("movies")
        );
    }

    #[tokio::test]
    async fn test_route_failure_is_verbatim() {
        let (client, server) = tokio::io::duplex(4096);
        let failure = FailureMessage::new(BoltErrorCode::DATABASE_NOT_FOUND, "no such db");
        let server = scripted_server(
            server,
            [0, 0, 4, 4],
            vec![vec![BoltResponse::Failure(failure.clone())]],
        );

        let mut channel = channel(client);
        channel.handshake(&Handshake::new(), false).await.unwrap();
        let err = channel.route(&RouteRequest::new("nope")).await.unwrap_err();
        assert!(matches!(err, DriverError::Failure(ref f) if *f == failure));
        assert!(err.stops_route_discovery());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_route_without_table_is_invalid_metadata() {
        let (client, server) = tokio::io::duplex(4096);
        let server = scripted_server(server, [0, 0, 4, 4], vec![vec![success(vec![])]]);

        let mut channel = channel(client);
        channel.handshake(&Handshake::new(), false).await.unwrap();
        let err = channel.route(&RouteRequest::default()).await.unwrap_err();
        assert!(matches!(err, DriverError::InvalidMetadata { ref key, .. } if key == "rt"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_route_unsupported_before_4_3() {
        let (client, server) = tokio::io::duplex(4096);
        let server = scripted_server(server, [0, 0, 2, 4], vec![]);

        let mut channel = channel(client);
        channel.handshake(&Handshake::new(), false).await.unwrap();
        let err = channel.route(&RouteRequest::default()).await.unwrap_err();
        assert!(matches!(
            err,
            DriverError::Bolt(BoltError::UnsupportedByProtocolVersion {
                version: BoltVersion::V4_2,
                ..
            })
        ));
        // nothing reached the wire
        assert!(channel.is_ready());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_recv_after_server_close() {
        let (client, server) = tokio::io::duplex(4096);
        let server = scripted_server(server, [0, 0, 4, 5], vec![]);

        let mut channel = channel(client);
        channel.handshake(&Handshake::new(), false).await.unwrap();
        server.await.unwrap();

        let err = channel.recv().await.unwrap_err();
        assert!(matches!(err, BoltError::ConnectionClosed));
        assert_eq!(channel.state(), ChannelState::Closed);
    }

    #[tokio::test]
    async fn test_oversized_response_makes_channel_defunct() {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let big = "x".repeat(2048);
        let server = scripted_server(
            server,
            [0, 0, 4, 5],
            vec![vec![success(vec![("bookmark", big.as_str().into())])]],
        );

        let mut channel = channel(client).with_max_message_size(1024);
        channel.handshake(&Handshake::new(), false).await.unwrap();
        let err = channel
            .run_pipeline(vec![(BoltRequest::Reset, ResponseHandler::new("RESET"))])
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::Bolt(BoltError::MessageTooLarge { .. })));
        assert_eq!(channel.state(), ChannelState::Defunct);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_close_sends_goodbye() {
        let (client, server) = tokio::io::duplex(4096);
        let server = scripted_server(server, [0, 0, 4, 5], vec![vec![]]);

        let mut channel = channel(client);
        channel.handshake(&Handshake::new(), false).await.unwrap();
        channel.close().await;
        assert_eq!(channel.state(), ChannelState::Closed);

        let received = server.await.unwrap();
        assert_eq!(received[0].tag, tag::GOODBYE);
    }
}
