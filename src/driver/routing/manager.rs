//! 라우팅 테이블 매니저
//!
//! 데이터베이스별 라우팅 테이블 캐시. 데이터베이스마다 갱신 락이 하나씩 있어
//! 동시에 같은 데이터베이스를 요청하면 ROUTE는 한 번만 나가고, 기다린 호출자는
//! 성공이든 실패든 그 시도의 결과를 함께 받는다.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::bolt::FailureMessage;

use super::super::address::ServerAddress;
use super::super::config::RoutingConfig;
use super::super::error::{DriverError, DriverResult};
use super::clock::Clock;
use super::fetcher::{RouteFetcher, RouteRequest};
use super::table::RoutingTable;

// ============================================================================
// RoutingLookup - 조회 결과
// ============================================================================

/// 돌려준 테이블의 신선도
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// TTL 안쪽이거나 방금 갱신됨
    Fresh,
    /// 갱신에 실패해 만료된 테이블을 한 번 재사용함
    Stale,
}

/// [`RoutingTableManager::get`] 결과
#[derive(Debug, Clone)]
pub struct RoutingLookup {
    /// 라우팅 테이블
    pub table: Arc<RoutingTable>,
    /// 신선도
    pub freshness: Freshness,
}

impl RoutingLookup {
    fn fresh(table: Arc<RoutingTable>) -> Self {
        Self {
            table,
            freshness: Freshness::Fresh,
        }
    }

    /// 만료된 테이블인지 확인
    pub fn is_stale(&self) -> bool {
        self.freshness == Freshness::Stale
    }
}

// ============================================================================
// Slot - 데이터베이스별 캐시 항목
// ============================================================================

#[derive(Default)]
struct Slot {
    /// 갱신은 이 락을 잡은 채로만 수행
    refresh: tokio::sync::Mutex<()>,
    state: Mutex<SlotState>,
}

#[derive(Default)]
struct SlotState {
    table: Option<Arc<RoutingTable>>,
    /// 끝난 갱신 시도마다 증가 (실패 포함)
    attempts: u64,
    /// 마지막 갱신 시도의 결과
    last: Option<Attempt>,
    invalidated: bool,
    stale_served: bool,
}

impl SlotState {
    fn usable(&self, now: std::time::Instant) -> Option<Arc<RoutingTable>> {
        match &self.table {
            Some(table) if !self.invalidated && !table.is_stale_at(now) => Some(table.clone()),
            _ => None,
        }
    }

    fn finish(&mut self, attempt: Attempt) {
        self.attempts += 1;
        self.last = Some(attempt);
    }
}

/// 갱신 시도 하나의 결과. 같은 시도를 기다린 호출자들이 그대로 받는다.
#[derive(Debug, Clone)]
enum Attempt {
    Updated,
    Stale(Arc<RoutingTable>),
    Rejected(FailureMessage),
    Unavailable(String),
}

impl Attempt {
    fn failed(err: &DriverError) -> Self {
        match err {
            DriverError::Failure(failure) => Self::Rejected(failure.clone()),
            DriverError::RoutingUnavailable { reason, .. } => Self::Unavailable(reason.clone()),
            other => Self::Unavailable(other.to_string()),
        }
    }

    fn replay(
        &self,
        database: &str,
        table: Option<&Arc<RoutingTable>>,
    ) -> DriverResult<RoutingLookup> {
        match self {
            Self::Updated => match table {
                Some(table) => Ok(RoutingLookup::fresh(table.clone())),
                None => Err(DriverError::routing_unavailable(
                    database,
                    "Routing table was removed during refresh",
                )),
            },
            Self::Stale(table) => Ok(RoutingLookup {
                table: table.clone(),
                freshness: Freshness::Stale,
            }),
            Self::Rejected(failure) => Err(DriverError::Failure(failure.clone())),
            Self::Unavailable(reason) => {
                Err(DriverError::routing_unavailable(database, reason.clone()))
            }
        }
    }
}

// ============================================================================
// RoutingTableManager - 라우팅 테이블 매니저
// ============================================================================

/// 라우팅 테이블 매니저
pub struct RoutingTableManager<F> {
    config: RoutingConfig,
    fetcher: F,
    clock: Arc<dyn Clock>,
    slots: RwLock<HashMap<String, Arc<Slot>>>,
}

impl<F: RouteFetcher> RoutingTableManager<F> {
    /// 새 매니저 생성
    pub fn new(config: RoutingConfig, fetcher: F, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            fetcher,
            clock,
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// 설정
    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// 조회기
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// 데이터베이스의 라우팅 테이블
    ///
    /// 캐시된 테이블이 TTL 안쪽이면 그대로, 아니면 ROUTE로 갱신한다.
    /// 갱신이 실패하면 만료된 테이블을 한 번만 [`Freshness::Stale`]로 돌려주고,
    /// 연속 두 번째 실패부터는 `RoutingUnavailable`이다.
    pub async fn get(&self, database: &str) -> DriverResult<RoutingLookup> {
        let slot = self.slot(database);

        let seen = {
            let state = slot.state.lock();
            if let Some(table) = state.usable(self.clock.now()) {
                return Ok(RoutingLookup::fresh(table));
            }
            state.attempts
        };

        let _refreshing = slot.refresh.lock().await;

        let current = {
            let state = slot.state.lock();
            if state.attempts != seen {
                // another caller finished an attempt while we were queued
                if let Some(last) = &state.last {
                    return last.replay(database, state.table.as_ref());
                }
            }
            if let Some(table) = state.usable(self.clock.now()) {
                return Ok(RoutingLookup::fresh(table));
            }
            state.table.clone()
        };

        match self.refresh(database, current.as_deref()).await {
            Ok(table) => {
                let table = Arc::new(table);
                {
                    let mut state = slot.state.lock();
                    state.table = Some(table.clone());
                    state.invalidated = false;
                    state.stale_served = false;
                    state.finish(Attempt::Updated);
                }
                info!("Routing table is updated => {}", table);
                self.purge_aged();
                Ok(RoutingLookup::fresh(table))
            }
            Err(err) if err.stops_route_discovery() => {
                slot.state.lock().finish(Attempt::failed(&err));
                Err(err)
            }
            Err(err) => {
                let mut state = slot.state.lock();
                match state.table.clone() {
                    Some(table) if !state.stale_served => {
                        state.stale_served = true;
                        state.finish(Attempt::Stale(table.clone()));
                        warn!(
                            "Using stale routing table for database '{}' after failed refresh: {}",
                            database, err
                        );
                        Ok(RoutingLookup {
                            table,
                            freshness: Freshness::Stale,
                        })
                    }
                    _ => {
                        state.finish(Attempt::failed(&err));
                        Err(err)
                    }
                }
            }
        }
    }

    /// 다음 [`get`](Self::get)이 나이와 상관없이 갱신하도록 표시
    pub fn invalidate(&self, database: &str) {
        if let Some(slot) = self.slots.read().get(database) {
            slot.state.lock().invalidated = true;
        }
    }

    /// 모든 역할에서 서버 제외
    pub fn forget_server(&self, database: &str, address: &ServerAddress) {
        self.replace_table(database, |table| table.without_server(address));
    }

    /// 라이터 목록에서 서버 제외
    pub fn forget_writer(&self, database: &str, address: &ServerAddress) {
        self.replace_table(database, |table| table.without_writer(address));
    }

    /// 캐시된 테이블 (갱신하지 않음)
    pub fn table(&self, database: &str) -> Option<Arc<RoutingTable>> {
        let slot = self.slots.read().get(database).cloned()?;
        let table = slot.state.lock().table.clone();
        table
    }

    /// 캐시된 데이터베이스 이름
    pub fn databases(&self) -> Vec<String> {
        self.slots.read().keys().cloned().collect()
    }

    /// TTL이 지나고 정리 지연 시간도 지난 테이블 제거
    pub fn purge_aged(&self) {
        let now = self.clock.now();
        let delay = self.config.purge_delay;
        self.slots.write().retain(|database, slot| {
            let expired = slot
                .state
                .lock()
                .table
                .as_ref()
                .map_or(false, |table| table.is_expired_for(delay, now));
            if expired {
                debug!("Purging routing table for database '{}'", database);
            }
            !expired
        });
    }

    /// 데이터베이스 항목 제거
    pub fn remove(&self, database: &str) {
        self.slots.write().remove(database);
    }

    /// 모든 항목 제거
    pub fn clear(&self) {
        self.slots.write().clear();
    }

    fn slot(&self, database: &str) -> Arc<Slot> {
        if let Some(slot) = self.slots.read().get(database) {
            return slot.clone();
        }
        self.slots
            .write()
            .entry(database.to_string())
            .or_default()
            .clone()
    }

    fn replace_table(&self, database: &str, f: impl FnOnce(&RoutingTable) -> RoutingTable) {
        let Some(slot) = self.slots.read().get(database).cloned() else {
            return;
        };
        let mut state = slot.state.lock();
        if let Some(table) = state.table.take() {
            state.table = Some(Arc::new(f(&table)));
        }
    }

    /// 라우터를 차례로 시도해 새 테이블을 얻는다
    ///
    /// 현재 테이블의 라우터가 먼저, 아직 시도하지 않은 초기 라우터가 그 다음.
    async fn refresh(
        &self,
        database: &str,
        current: Option<&RoutingTable>,
    ) -> DriverResult<RoutingTable> {
        debug!("Updating routing table for database '{}'", database);

        let request = RouteRequest::new(database)
            .with_routing_context(self.config.routing_context.clone());

        let known = current.map(|table| table.routers.as_slice()).unwrap_or(&[]);
        let mut tried: Vec<&ServerAddress> = Vec::new();

        for router in known.iter().chain(&self.config.initial_routers) {
            if tried.contains(&router) {
                continue;
            }
            tried.push(router);

            let result =
                tokio::time::timeout(self.config.fetch_timeout, self.fetcher.fetch(router, &request))
                    .await;

            match result {
                Ok(Ok(info)) => {
                    let table = RoutingTable::from_info(info, database, self.clock.now());
                    if !table.has_routers() {
                        debug!(
                            "Skipping routing table without routers from server '{}' for database '{}'",
                            router, database
                        );
                        continue;
                    }
                    return Ok(table);
                }
                Ok(Err(err)) if err.stops_route_discovery() => {
                    error!(
                        "Failed to update routing table from server '{}' for database '{}': {}",
                        router, database, err
                    );
                    return Err(err);
                }
                Ok(Err(err)) => {
                    warn!(
                        "Failed to update routing table from server '{}' for database '{}': {}",
                        router, database, err
                    );
                }
                Err(_) => {
                    warn!(
                        "Timed out after {:?} updating routing table from server '{}' for database '{}'",
                        self.config.fetch_timeout, router, database
                    );
                }
            }
        }

        Err(DriverError::routing_unavailable(
            database,
            "Failed to connect to any routing server",
        ))
    }
}

impl<F> std::fmt::Debug for RoutingTableManager<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingTableManager")
            .field("initial_routers", &self.config.initial_routers)
            .field("databases", &self.slots.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use futures::future::{join_all, BoxFuture};

    use crate::bolt::{BoltError, BoltErrorCode, FailureMessage};
    use crate::driver::routing::{ManualClock, RoutingInfo};

    fn addr(s: &str) -> ServerAddress {
        ServerAddress::parse(s).unwrap()
    }

    fn info(ttl: u64) -> RoutingInfo {
        RoutingInfo {
            ttl: Duration::from_secs(ttl),
            database: None,
            routers: vec![addr("r1:7687")],
            readers: vec![addr("r2:7687")],
            writers: vec![addr("r1:7687")],
        }
    }

    struct MockFetcher {
        script: Mutex<VecDeque<DriverResult<RoutingInfo>>>,
        fallback: RoutingInfo,
        calls: AtomicUsize,
        tried: Mutex<Vec<ServerAddress>>,
        delay: Duration,
    }

    impl MockFetcher {
        fn new(fallback: RoutingInfo) -> Self {
            Self {
                script: Mutex::new(VecDeque::new()),
                fallback,
                calls: AtomicUsize::new(0),
                tried: Mutex::new(Vec::new()),
                delay: Duration::ZERO,
            }
        }

        fn push(&self, outcome: DriverResult<RoutingInfo>) {
            self.script.lock().push_back(outcome);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RouteFetcher for MockFetcher {
        fn fetch<'a>(
            &'a self,
            router: &'a ServerAddress,
            _request: &'a RouteRequest,
        ) -> BoxFuture<'a, DriverResult<RoutingInfo>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.tried.lock().push(router.clone());
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                let next = self.script.lock().pop_front();
                next.unwrap_or_else(|| Ok(self.fallback.clone()))
            })
        }
    }

    fn manager(fetcher: MockFetcher) -> (RoutingTableManager<MockFetcher>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let config = RoutingConfig::new(vec![addr("r1:7687")]);
        (RoutingTableManager::new(config, fetcher, clock.clone()), clock)
    }

    fn connection_lost() -> DriverError {
        DriverError::Bolt(BoltError::ConnectionClosed)
    }

    #[tokio::test]
    async fn test_fresh_table_is_cached() {
        let (manager, clock) = manager(MockFetcher::new(info(300)));

        let first = manager.get("movies").await.unwrap();
        assert_eq!(first.freshness, Freshness::Fresh);
        assert_eq!(first.table.database, "movies");

        clock.advance(Duration::from_secs(299));
        let second = manager.get("movies").await.unwrap();
        assert!(Arc::ptr_eq(&first.table, &second.table));
        assert_eq!(manager.fetcher().calls(), 1);
    }

    #[tokio::test]
    async fn test_expired_table_is_refreshed() {
        let (manager, clock) = manager(MockFetcher::new(info(300)));
        manager.get("movies").await.unwrap();

        clock.advance(Duration::from_secs(300));
        let lookup = manager.get("movies").await.unwrap();
        assert_eq!(lookup.freshness, Freshness::Fresh);
        assert_eq!(manager.fetcher().calls(), 2);
        assert_eq!(lookup.table.received_at, clock.now());
    }

    #[tokio::test]
    async fn test_invalidate_forces_refresh() {
        let (manager, _clock) = manager(MockFetcher::new(info(300)));
        manager.get("movies").await.unwrap();

        manager.invalidate("movies");
        manager.get("movies").await.unwrap();
        assert_eq!(manager.fetcher().calls(), 2);

        manager.get("movies").await.unwrap();
        assert_eq!(manager.fetcher().calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let mut fetcher = MockFetcher::new(info(0));
        fetcher.delay = Duration::from_millis(20);
        let (manager, _clock) = manager(fetcher);

        let lookups = join_all((0..50).map(|_| manager.get("movies"))).await;

        assert_eq!(manager.fetcher().calls(), 1);
        let first = lookups[0].as_ref().unwrap().table.clone();
        for lookup in lookups {
            let lookup = lookup.unwrap();
            assert_eq!(lookup.freshness, Freshness::Fresh);
            assert!(Arc::ptr_eq(&lookup.table, &first));
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_failed_fetch() {
        let mut fetcher = MockFetcher::new(info(10));
        fetcher.delay = Duration::from_millis(20);
        let (manager, clock) = manager(fetcher);
        let original = manager.get("movies").await.unwrap().table;

        clock.advance(Duration::from_secs(11));
        manager.fetcher().push(Err(connection_lost()));
        let lookups = join_all((0..50).map(|_| manager.get("movies"))).await;

        assert_eq!(manager.fetcher().calls(), 2);
        for lookup in lookups {
            let lookup = lookup.unwrap();
            assert!(lookup.is_stale());
            assert!(Arc::ptr_eq(&lookup.table, &original));
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_unavailable_error() {
        let mut fetcher = MockFetcher::new(info(300));
        fetcher.delay = Duration::from_millis(20);
        for _ in 0..50 {
            fetcher.push(Err(connection_lost()));
        }
        let (manager, _clock) = manager(fetcher);

        let lookups = join_all((0..50).map(|_| manager.get("movies"))).await;

        assert_eq!(manager.fetcher().calls(), 1);
        for lookup in lookups {
            match lookup {
                Err(DriverError::RoutingUnavailable { database, .. }) => {
                    assert_eq!(database, "movies")
                }
                other => panic!("unexpected: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_security_failure() {
        let mut fetcher = MockFetcher::new(info(300));
        fetcher.delay = Duration::from_millis(20);
        let failure = FailureMessage::new(BoltErrorCode::UNAUTHORIZED, "bad credentials");
        fetcher.push(Err(DriverError::Failure(failure.clone())));
        let (manager, _clock) = manager(fetcher);

        let lookups = join_all((0..10).map(|_| manager.get("movies"))).await;

        assert_eq!(manager.fetcher().calls(), 1);
        for lookup in lookups {
            assert_eq!(lookup.unwrap_err().failure(), Some(&failure));
        }
    }

    #[tokio::test]
    async fn test_stale_served_once_then_unavailable() {
        let (manager, clock) = manager(MockFetcher::new(info(10)));
        let original = manager.get("movies").await.unwrap().table;

        clock.advance(Duration::from_secs(11));
        manager.fetcher().push(Err(connection_lost()));
        let lookup = manager.get("movies").await.unwrap();
        assert!(lookup.is_stale());
        assert!(Arc::ptr_eq(&lookup.table, &original));

        manager.fetcher().push(Err(connection_lost()));
        let err = manager.get("movies").await.unwrap_err();
        assert!(matches!(err, DriverError::RoutingUnavailable { .. }));
        assert!(err.is_retryable());

        // a success resets the policy
        manager.get("movies").await.unwrap();
        clock.advance(Duration::from_secs(11));
        manager.fetcher().push(Err(connection_lost()));
        assert!(manager.get("movies").await.unwrap().is_stale());
    }

    #[tokio::test]
    async fn test_no_entry_and_failure_is_unavailable() {
        let fetcher = MockFetcher::new(info(300));
        fetcher.push(Err(connection_lost()));
        let (manager, _clock) = manager(fetcher);

        let err = manager.get("movies").await.unwrap_err();
        match err {
            DriverError::RoutingUnavailable { database, .. } => assert_eq!(database, "movies"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_security_failure_surfaces_verbatim() {
        let clock = Arc::new(ManualClock::new());
        let config = RoutingConfig::new(vec![addr("r1:7687"), addr("r2:7687")]);
        let fetcher = MockFetcher::new(info(10));
        let manager = RoutingTableManager::new(config, fetcher, clock.clone());
        manager.get("movies").await.unwrap();

        clock.advance(Duration::from_secs(11));
        let failure = FailureMessage::new(BoltErrorCode::UNAUTHORIZED, "bad credentials");
        manager.fetcher().push(Err(DriverError::Failure(failure.clone())));

        let err = manager.get("movies").await.unwrap_err();
        assert_eq!(err.failure(), Some(&failure));
        // r2 is never asked
        assert_eq!(manager.fetcher().calls(), 2);
    }

    #[tokio::test]
    async fn test_database_not_found_stops_discovery() {
        let fetcher = MockFetcher::new(info(300));
        fetcher.push(Err(DriverError::Failure(FailureMessage::new(
            BoltErrorCode::DATABASE_NOT_FOUND,
            "no such database",
        ))));
        let (manager, _clock) = manager(fetcher);

        let err = manager.get("missing").await.unwrap_err();
        assert!(err.failure().map_or(false, FailureMessage::is_database_not_found));
    }

    #[tokio::test]
    async fn test_zero_writers_is_valid() {
        let mut without_writers = info(300);
        without_writers.writers.clear();
        let (manager, _clock) = manager(MockFetcher::new(without_writers));

        let lookup = manager.get("movies").await.unwrap();
        assert!(lookup.table.writers.is_empty());
        assert!(!lookup.table.has_writers());
        assert_eq!(lookup.freshness, Freshness::Fresh);
    }

    #[tokio::test]
    async fn test_router_order() {
        let clock = Arc::new(ManualClock::new());
        let config = RoutingConfig::new(vec![addr("r2:7687"), addr("r3:7687")]);
        let mut first = info(10);
        first.routers = vec![addr("r1:7687"), addr("r2:7687")];
        let fetcher = MockFetcher::new(first);
        let manager = RoutingTableManager::new(config, fetcher, clock.clone());

        manager.get("movies").await.unwrap();
        manager.fetcher().tried.lock().clear();

        clock.advance(Duration::from_secs(11));
        for _ in 0..3 {
            manager.fetcher().push(Err(connection_lost()));
        }
        assert!(manager.get("movies").await.unwrap().is_stale());
        assert_eq!(
            *manager.fetcher().tried.lock(),
            vec![addr("r1:7687"), addr("r2:7687"), addr("r3:7687")]
        );
    }

    #[tokio::test]
    async fn test_table_without_routers_is_skipped() {
        let clock = Arc::new(ManualClock::new());
        let config = RoutingConfig::new(vec![addr("r1:7687"), addr("r2:7687")]);
        let fetcher = MockFetcher::new(info(300));
        let mut empty = info(300);
        empty.routers.clear();
        fetcher.push(Ok(empty));
        let manager = RoutingTableManager::new(config, fetcher, clock);

        let lookup = manager.get("movies").await.unwrap();
        assert!(lookup.table.has_routers());
        assert_eq!(manager.fetcher().calls(), 2);
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let clock = Arc::new(ManualClock::new());
        let config = RoutingConfig::builder()
            .with_router(addr("r1:7687"))
            .with_fetch_timeout(Duration::from_millis(10))
            .build()
            .unwrap();
        let mut fetcher = MockFetcher::new(info(300));
        fetcher.delay = Duration::from_millis(200);
        let manager = RoutingTableManager::new(config, fetcher, clock);

        let err = manager.get("movies").await.unwrap_err();
        assert!(matches!(err, DriverError::RoutingUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_database_filled_from_response() {
        let mut named = info(300);
        named.database = Some("neo4j".into());
        let (manager, _clock) = manager(MockFetcher::new(named));

        let lookup = manager.get("").await.unwrap();
        assert_eq!(lookup.table.database, "neo4j");
    }

    #[tokio::test]
    async fn test_forget_server_and_writer() {
        let (manager, _clock) = manager(MockFetcher::new(info(300)));
        let before = manager.get("movies").await.unwrap().table;

        manager.forget_writer("movies", &addr("r1:7687"));
        let table = manager.table("movies").unwrap();
        assert!(table.writers.is_empty());
        assert_eq!(table.routers, vec![addr("r1:7687")]);
        // previously handed out tables are untouched
        assert_eq!(before.writers, vec![addr("r1:7687")]);

        manager.forget_server("movies", &addr("r2:7687"));
        assert!(manager.table("movies").unwrap().readers.is_empty());

        // forgetting does not count as a refresh
        manager.get("movies").await.unwrap();
        assert_eq!(manager.fetcher().calls(), 1);
    }

    #[tokio::test]
    async fn test_purge_aged() {
        let (manager, clock) = manager(MockFetcher::new(info(10)));
        manager.get("old").await.unwrap();

        clock.advance(Duration::from_secs(41));
        manager.fetcher().push(Ok(info(300)));
        manager.get("new").await.unwrap();

        assert!(manager.table("old").is_none());
        assert!(manager.table("new").is_some());
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let (manager, _clock) = manager(MockFetcher::new(info(300)));
        manager.get("a").await.unwrap();
        manager.get("b").await.unwrap();

        manager.remove("a");
        assert_eq!(manager.databases(), vec!["b".to_string()]);

        manager.clear();
        assert!(manager.databases().is_empty());
        assert!(manager.table("b").is_none());
    }
}
