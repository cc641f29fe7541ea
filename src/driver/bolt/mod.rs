//! Bolt protocol client implementation for the driver.
//!
//! This module connects the wire layer in [`crate::bolt`] to a live byte
//! stream. It adds only the client-side connection logic.
//!
//! # Architecture
//!
//! ```text
//! RoutingTableManager
//!   └── BoltRouteFetcher (RouteFetcher)
//!         ├── Connector (TcpConnector)
//!         └── BoltChannel (handshake + framing)
//!               ├── BoltClientCodec (catalog pinned at handshake)
//!               └── ResponsePipeline (handlers + collectors)
//! ```

pub mod client;
pub mod connection;

pub use client::{BoltRouteFetcher, Connector, TcpConnector};
pub use connection::{BoltChannel, ChannelState};
