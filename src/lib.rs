//! # Zeta4G Wire
//!
//! Client-side Bolt wire engine for the [Zeta4G](https://github.com/zeta9044/zeta4g)
//! graph database.
//!
//! ## Features
//!
//! - **PackStream** - Encoding and decoding of every wire value, big-endian on the wire
//! - **Versioned Catalog** - Bolt 4.0 through 5.4, one immutable message catalog per version
//! - **Response Handling** - Pluggable metadata collectors for SUCCESS replies
//! - **Cluster Routing** - Per-database routing tables with single-flight refresh
//! - **Async/Await** - Built on Tokio; the channel works over any byte stream
//!
//! ## PackStream
//!
//! ```rust
//! use zeta4g_wire::bolt::packstream::{decode, encode};
//! use zeta4g_wire::bolt::PackStreamValue;
//!
//! let value = PackStreamValue::List(vec![1i64.into(), "two".into(), PackStreamValue::Null]);
//! let bytes = encode(&value)?;
//! assert_eq!(decode(&bytes)?, value);
//! # Ok::<(), zeta4g_wire::bolt::PackStreamError>(())
//! ```
//!
//! ## Message Catalog
//!
//! Messages are laid out by the catalog of the negotiated version. A message
//! the version does not know is refused before anything is written:
//!
//! ```rust
//! use zeta4g_wire::bolt::{BoltRequest, BoltVersion, MessageCatalog, PullMessage, RouteMessage};
//!
//! let catalog = MessageCatalog::for_version(BoltVersion::V4_2);
//! assert!(catalog.encode_message(&BoltRequest::Pull(PullMessage::all())).is_ok());
//! assert!(catalog.encode_message(&BoltRequest::Route(RouteMessage::new())).is_err());
//! ```
//!
//! ## Response Handling
//!
//! ```rust
//! use zeta4g_wire::bolt::{BoltResponse, SuccessMessage};
//! use zeta4g_wire::driver::response::{BookmarkCollector, ResponseHandler};
//!
//! let mut success = SuccessMessage::new();
//! success.add("bookmark", "bm:42");
//!
//! let mut handler = ResponseHandler::new("COMMIT").with_collector(BookmarkCollector);
//! handler.handle(BoltResponse::Success(success))?;
//! assert_eq!(handler.get::<BookmarkCollector>().map(String::as_str), Some("bm:42"));
//! # Ok::<(), zeta4g_wire::DriverError>(())
//! ```
//!
//! ## Routing
//!
//! ```ignore
//! use zeta4g_wire::bolt::AuthToken;
//! use zeta4g_wire::driver::bolt::{BoltRouteFetcher, TcpConnector};
//! use zeta4g_wire::{EngineConfig, RoutingConfig, WireEngine};
//!
//! let config = EngineConfig::default();
//! let fetcher = BoltRouteFetcher::new(TcpConnector, config.clone(), AuthToken::basic("u", "p"));
//! let routing = RoutingConfig::builder()
//!     .with_routers_str("core-1:7687,core-2:7687")?
//!     .build()?;
//! let engine = WireEngine::new(config, routing, fetcher)?;
//!
//! let lookup = engine.routing_table("movies").await?;
//! if lookup.is_stale() {
//!     // served once from the expired table after a failed refresh
//! }
//! ```
//!
//! ## Modules
//!
//! - [`bolt`] - Byte-level protocol: endian, PackStream, messages, catalog, handshake, framing
//! - [`driver`] - Response handling, routing tables and the Bolt channel
//!

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod bolt;
pub mod driver;

// Re-exports for convenience
pub use driver::{
    DriverError, DriverResult, EngineConfig, Freshness, RoutingConfig, RoutingLookup,
    RoutingTable, RoutingTableManager, ServerAddress, WireEngine,
};

pub use bolt::{
    BoltError, BoltRequest, BoltResponse, BoltResult, BoltVersion, MessageCatalog,
    PackStreamValue,
};
