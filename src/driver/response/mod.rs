//! 응답 처리 모듈
//!
//! - [`ResponseHandler`] - 요청 하나의 응답 상태 기계
//! - [`MetadataCollector`] - SUCCESS 메타데이터에서 값을 읽는 수집기
//! - [`ResponsePipeline`] - 파이프라인 요청의 핸들러 FIFO
//!
//! # 예시
//!
//! ```ignore
//! use zeta4g_wire::driver::response::{ResponseHandler, RoutingTableCollector};
//!
//! let mut handler = ResponseHandler::new("ROUTE").with_collector(RoutingTableCollector);
//! handler.handle(response)?;
//! let info = handler.take::<RoutingTableCollector>();
//! ```

mod collector;
mod handler;
mod pipeline;

pub use collector::{
    BookmarkCollector, Collected, CountersCollector, DatabaseCollector, FieldsCollector,
    HasMoreCollector, MetadataCollector, NotificationsCollector, PlanCollector, QueryIdCollector,
    QueryType, QueryTypeCollector, RoutingTableCollector, ServerInfo, ServerInfoCollector,
    TimeToFirstCollector, TimeToLastCollector,
};
pub use handler::{HandlerState, ResponseHandler};
pub use pipeline::ResponsePipeline;
