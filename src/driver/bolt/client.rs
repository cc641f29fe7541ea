//! Bolt route fetcher for driver use.
//!
//! Opens a short-lived channel to one router, initializes it, asks for
//! the routing table and closes it again.

use std::time::Duration;

use futures::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::debug;

use crate::bolt::message::BoltAgent;
use crate::bolt::{AuthToken, BoltResult, Handshake, HelloMessage, PackStreamValue};

use super::super::address::ServerAddress;
use super::super::config::EngineConfig;
use super::super::error::DriverResult;
use super::super::routing::{RouteFetcher, RouteRequest, RoutingInfo};
use super::connection::BoltChannel;

/// Opens byte streams to servers.
pub trait Connector: Send + Sync {
    /// Stream type
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    /// Connect to `address`.
    fn connect<'a>(&'a self, address: &'a ServerAddress) -> BoxFuture<'a, BoltResult<Self::Stream>>;
}

/// Plain TCP connector.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn connect<'a>(&'a self, address: &'a ServerAddress) -> BoxFuture<'a, BoltResult<TcpStream>> {
        Box::pin(async move {
            let stream = TcpStream::connect((address.host.as_str(), address.port)).await?;
            // Enable TCP nodelay for lower latency
            stream.set_nodelay(true).ok();
            Ok(stream)
        })
    }
}

/// [`RouteFetcher`] that speaks Bolt to the router.
#[derive(Debug, Clone)]
pub struct BoltRouteFetcher<C> {
    connector: C,
    config: EngineConfig,
    auth: AuthToken,
    io_timeout: Option<Duration>,
}

impl<C: Connector> BoltRouteFetcher<C> {
    /// Create a fetcher.
    pub fn new(connector: C, config: EngineConfig, auth: AuthToken) -> Self {
        Self {
            connector,
            config,
            auth,
            io_timeout: None,
        }
    }

    /// Apply a per read/write deadline to the router channels.
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = Some(timeout);
        self
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn hello(&self, router: &ServerAddress, request: &RouteRequest) -> HelloMessage {
        let mut routing: crate::bolt::Metadata = request
            .routing_context
            .iter()
            .map(|(k, v)| (k.clone(), PackStreamValue::String(v.clone())))
            .collect();
        routing.insert("address".to_string(), PackStreamValue::String(router.to_string()));

        HelloMessage::new(&self.config.user_agent)
            .with_routing(routing)
            .with_bolt_agent(BoltAgent {
                product: self.config.user_agent.clone(),
                platform: Some(format!("{}; {}", std::env::consts::OS, std::env::consts::ARCH)),
                language: Some("Rust".to_string()),
            })
    }

    async fn fetch_from(
        &self,
        router: &ServerAddress,
        request: &RouteRequest,
    ) -> DriverResult<RoutingInfo> {
        let stream = self.connector.connect(router).await?;
        let mut channel = BoltChannel::new(stream, router.clone())
            .with_max_message_size(self.config.max_message_size);
        if let Some(timeout) = self.io_timeout {
            channel = channel.with_io_timeout(timeout);
        }

        let handshake = Handshake::with_versions(&self.config.preferred_versions);
        let result = async {
            channel.handshake(&handshake, self.config.utc_patch).await?;
            channel
                .hello(self.hello(router, request), self.auth.clone())
                .await?;
            channel.route(request).await
        }
        .await;

        channel.close().await;
        if let Err(ref e) = result {
            debug!("Failed to fetch routing table from server '{}': {}", router, e);
        }
        result
    }
}

impl<C: Connector> RouteFetcher for BoltRouteFetcher<C> {
    fn fetch<'a>(
        &'a self,
        router: &'a ServerAddress,
        request: &'a RouteRequest,
    ) -> BoxFuture<'a, DriverResult<RoutingInfo>> {
        Box::pin(self.fetch_from(router, request))
    }
}
