//! Driver Module
//!
//! 와이어 계층 위의 클라이언트 측 엔진: 응답 처리, 라우팅, Bolt 채널
//!
//! # 구성
//!
//! - [`response`] - 응답 핸들러와 메타데이터 수집기
//! - [`routing`] - 데이터베이스별 라우팅 테이블 매니저
//! - [`bolt`] - 바이트 스트림 위의 Bolt 채널과 ROUTE 조회기
//! - [`WireEngine`] - 세션 계층이 쓰는 진입점
//!
//! # 예시
//!
//! ```ignore
//! use zeta4g_wire::driver::bolt::{BoltRouteFetcher, TcpConnector};
//! use zeta4g_wire::driver::{EngineConfig, RoutingConfig, WireEngine};
//! use zeta4g_wire::bolt::AuthToken;
//!
//! let config = EngineConfig::default();
//! let fetcher = BoltRouteFetcher::new(
//!     TcpConnector,
//!     config.clone(),
//!     AuthToken::basic("zeta4g", "password"),
//! );
//! let routing = RoutingConfig::builder()
//!     .with_routers_str("server1:7687,server2:7687")?
//!     .build()?;
//!
//! let engine = WireEngine::new(config, routing, fetcher)?;
//! let lookup = engine.routing_table("movies").await?;
//! println!("{}", lookup.table);
//! ```

pub mod bolt;
pub mod response;
pub mod routing;
mod address;
mod config;
mod engine;
mod error;

// Re-exports
pub use address::{ServerAddress, DEFAULT_PORT};
pub use config::{
    EngineConfig, EngineConfigBuilder, RoutingConfig, RoutingConfigBuilder, DEFAULT_FETCH_TIMEOUT,
    DEFAULT_PURGE_DELAY,
};
pub use engine::{WireEngine, SUPPORTED_FEATURES};
pub use error::{DriverError, DriverResult};
pub use routing::{Freshness, RoutingLookup, RoutingTable, RoutingTableManager};
