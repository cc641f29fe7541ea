//! 라우팅 테이블 조회 경계
//!
//! [`RoutingTableManager`](super::RoutingTableManager)는 라우터 하나에 ROUTE를
//! 보내는 일을 [`RouteFetcher`]에 맡긴다. 실제 구현은
//! [`BoltRouteFetcher`](crate::driver::bolt::BoltRouteFetcher)이다.

use std::collections::HashMap;

use futures::future::BoxFuture;

use super::super::address::ServerAddress;
use super::super::error::DriverResult;
use super::table::RoutingInfo;

/// ROUTE 요청 내용
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteRequest {
    /// 데이터베이스 이름 (빈 문자열은 기본 데이터베이스)
    pub database: String,
    /// 라우팅 컨텍스트
    pub routing_context: HashMap<String, String>,
    /// 인과 일관성을 위한 북마크
    pub bookmarks: Vec<String>,
    /// 대리 실행 사용자 (impersonation)
    pub imp_user: Option<String>,
}

impl RouteRequest {
    /// 데이터베이스 지정 요청
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    /// 라우팅 컨텍스트 설정
    pub fn with_routing_context(mut self, context: HashMap<String, String>) -> Self {
        self.routing_context = context;
        self
    }

    /// 북마크 설정
    pub fn with_bookmarks(mut self, bookmarks: Vec<String>) -> Self {
        self.bookmarks = bookmarks;
        self
    }

    /// 대리 실행 사용자 설정 (Bolt 4.4+)
    pub fn with_imp_user(mut self, user: impl Into<String>) -> Self {
        self.imp_user = Some(user.into());
        self
    }

    /// ROUTE 메시지에 실을 데이터베이스 (`None`은 기본 데이터베이스)
    pub fn database_name(&self) -> Option<&str> {
        if self.database.is_empty() {
            None
        } else {
            Some(&self.database)
        }
    }
}

/// 라우터 하나에서 라우팅 정보를 가져온다
///
/// 서버 FAILURE는 `DriverError::Failure`로 그대로 돌려줘야 한다.
/// 매니저가 보안/북마크/데이터베이스 없음 실패를 구분해 탐색을 멈춘다.
pub trait RouteFetcher: Send + Sync {
    /// `router`에 ROUTE 요청
    fn fetch<'a>(
        &'a self,
        router: &'a ServerAddress,
        request: &'a RouteRequest,
    ) -> BoxFuture<'a, DriverResult<RoutingInfo>>;
}

impl<F: RouteFetcher + ?Sized> RouteFetcher for std::sync::Arc<F> {
    fn fetch<'a>(
        &'a self,
        router: &'a ServerAddress,
        request: &'a RouteRequest,
    ) -> BoxFuture<'a, DriverResult<RoutingInfo>> {
        (**self).fetch(router, request)
    }
}
