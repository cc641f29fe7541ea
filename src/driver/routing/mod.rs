//! 라우팅 모듈
//!
//! 클러스터의 데이터베이스별 라우팅 테이블을 관리합니다.
//!
//! # 개요
//!
//! [`RoutingTableManager`]는 데이터베이스 이름마다 [`RoutingTable`]을 캐시하고,
//! TTL이 지나거나 무효화되면 [`RouteFetcher`]를 통해 ROUTE 메시지로 갱신합니다.
//! 시간은 주입된 [`Clock`]으로 잽니다.
//!
//! # 예시
//!
//! ```ignore
//! use std::sync::Arc;
//! use zeta4g_wire::driver::routing::{RoutingTableManager, SystemClock};
//! use zeta4g_wire::driver::RoutingConfig;
//!
//! let config = RoutingConfig::builder()
//!     .with_routers_str("core-1:7687,core-2:7687")?
//!     .build()?;
//! let manager = RoutingTableManager::new(config, fetcher, Arc::new(SystemClock));
//!
//! let lookup = manager.get("movies").await?;
//! for writer in &lookup.table.writers {
//!     println!("{}", writer);
//! }
//! ```

mod clock;
mod fetcher;
mod manager;
mod table;

pub use clock::{Clock, ManualClock, SystemClock};
pub use fetcher::{RouteFetcher, RouteRequest};
pub use manager::{Freshness, RoutingLookup, RoutingTableManager};
pub use table::{RoutingInfo, RoutingTable, ServerRole};
