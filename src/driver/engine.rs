//! Wire Engine
//!
//! 세션 계층이 쓰는 진입점. 협상된 버전의 카탈로그로 메시지를 인코딩/디코딩하고
//! 데이터베이스별 라우팅 테이블을 조회한다.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::debug;

use crate::bolt::{BoltError, BoltRequest, BoltResponse, BoltResult, BoltVersion, MessageCatalog};

use super::address::ServerAddress;
use super::config::{EngineConfig, RoutingConfig};
use super::error::{DriverError, DriverResult};
use super::routing::{Clock, RouteFetcher, RoutingLookup, RoutingTableManager, SystemClock};

/// 테스트 하니스에 알리는 지원 기능 목록
pub const SUPPORTED_FEATURES: &[&str] = &[
    "Feature:Bolt:4.0",
    "Feature:Bolt:4.1",
    "Feature:Bolt:4.2",
    "Feature:Bolt:4.3",
    "Feature:Bolt:4.4",
    "Feature:Bolt:5.0",
    "Feature:Bolt:5.1",
    "Feature:Bolt:5.2",
    "Feature:Bolt:5.3",
    "Feature:Bolt:5.4",
    "Feature:Bolt:Patch:UTC",
    "Feature:Auth:Bearer",
    "Feature:Auth:Kerberos",
    "Feature:Auth:Custom",
    "Feature:Impersonation",
];

// ============================================================================
// WireEngine - 와이어 엔진
// ============================================================================

/// 와이어 엔진
///
/// 엔진 하나는 연결 하나에 대응한다. 협상 전에는 카탈로그가 없어 인코딩과
/// 디코딩이 실패하고, [`WireEngine::set_protocol`]로 한 번 정해진 버전은
/// 바꿀 수 없다. 같은 버전 안에서 utc 패치 여부만 바뀔 수 있다.
pub struct WireEngine<F> {
    config: EngineConfig,
    catalog: RwLock<Option<&'static MessageCatalog>>,
    routing: RoutingTableManager<F>,
}

impl<F: RouteFetcher> WireEngine<F> {
    /// 시스템 시계로 엔진 생성
    pub fn new(config: EngineConfig, routing: RoutingConfig, fetcher: F) -> DriverResult<Self> {
        Self::with_clock(config, routing, fetcher, Arc::new(SystemClock))
    }

    /// 시계를 지정해 엔진 생성
    pub fn with_clock(
        config: EngineConfig,
        routing: RoutingConfig,
        fetcher: F,
        clock: Arc<dyn Clock>,
    ) -> DriverResult<Self> {
        if config.preferred_versions.is_empty() {
            return Err(DriverError::configuration("no preferred protocol versions"));
        }

        Ok(Self {
            catalog: RwLock::new(None),
            routing: RoutingTableManager::new(routing, fetcher, clock),
            config,
        })
    }

    /// 엔진 설정
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 라우팅 테이블 매니저
    pub fn routing(&self) -> &RoutingTableManager<F> {
        &self.routing
    }

    /// 협상 결과 반영
    ///
    /// 선호 목록에 없는 버전은 설정 에러. 이미 다른 버전으로 협상된 뒤에는
    /// 프로토콜 에러.
    pub fn set_protocol(&self, version: BoltVersion, utc_patch: bool) -> DriverResult<()> {
        if !self.config.preferred_versions.contains(&version) {
            return Err(DriverError::configuration(format!(
                "Bolt {} is not among the preferred versions",
                version
            )));
        }

        let mut active = self.catalog.write();
        if let Some(current) = *active {
            if current.version() != version {
                return Err(BoltError::protocol(format!(
                    "protocol already negotiated as Bolt {}, refusing Bolt {}",
                    current.version(),
                    version
                ))
                .into());
            }
        }

        let catalog = MessageCatalog::for_negotiated(version, utc_patch && self.config.utc_patch);
        *active = Some(catalog);
        debug!(
            "Wire engine using Bolt {} (utc date-times: {})",
            version,
            catalog.utc_date_time()
        );
        Ok(())
    }

    /// 협상 완료 여부
    pub fn is_negotiated(&self) -> bool {
        self.catalog.read().is_some()
    }

    /// 현재 카탈로그 (협상 전에는 `None`)
    pub fn catalog(&self) -> Option<&'static MessageCatalog> {
        *self.catalog.read()
    }

    /// 현재 프로토콜 버전 (협상 전에는 `None`)
    pub fn protocol(&self) -> Option<BoltVersion> {
        self.catalog().map(MessageCatalog::version)
    }

    /// 다른 버전으로 다시 협상하면 피할 수 있는 에러인지 확인
    ///
    /// 협상이 끝난 뒤의 `UnsupportedByProtocolVersion`은 복구할 수 없다.
    pub fn is_recoverable_by_renegotiation(&self, err: &DriverError) -> bool {
        match err {
            DriverError::Bolt(err) => err.recoverable_by_renegotiation(self.is_negotiated()),
            _ => false,
        }
    }

    fn require_catalog(&self) -> BoltResult<&'static MessageCatalog> {
        self.catalog()
            .ok_or_else(|| BoltError::protocol("no protocol version negotiated"))
    }

    /// 요청을 PackStream 메시지 본문으로 인코딩 (청크 분할 전)
    pub fn encode_message(&self, request: &BoltRequest) -> DriverResult<Bytes> {
        let encoded = self.require_catalog()?.encode_message(request)?;
        if encoded.len() > self.config.max_message_size {
            return Err(BoltError::MessageTooLarge {
                size: encoded.len(),
                max: self.config.max_message_size,
            }
            .into());
        }
        Ok(encoded.freeze())
    }

    /// 청크를 합친 메시지 본문 하나를 응답으로 디코딩
    pub fn decode_response(&self, data: &[u8]) -> DriverResult<BoltResponse> {
        let catalog = self.require_catalog()?;
        if data.len() > self.config.max_message_size {
            return Err(BoltError::MessageTooLarge {
                size: data.len(),
                max: self.config.max_message_size,
            }
            .into());
        }
        Ok(catalog.decode_message(data)?)
    }

    /// 데이터베이스의 라우팅 테이블 (빈 문자열은 기본 데이터베이스)
    pub async fn routing_table(&self, database: &str) -> DriverResult<RoutingLookup> {
        self.routing.get(database).await
    }

    /// 다음 조회에서 라우팅 테이블을 강제로 갱신
    pub fn invalidate_routing(&self, database: &str) {
        self.routing.invalidate(database);
    }

    /// 연결할 수 없는 서버를 테이블에서 제거
    pub fn forget_server(&self, database: &str, address: &ServerAddress) {
        self.routing.forget_server(database, address);
    }

    /// 더 이상 쓰기를 받지 않는 서버를 writer에서 제거
    pub fn forget_writer(&self, database: &str, address: &ServerAddress) {
        self.routing.forget_writer(database, address);
    }

    /// 지원 기능 목록
    pub fn supported_features() -> &'static [&'static str] {
        SUPPORTED_FEATURES
    }
}

impl<F> std::fmt::Debug for WireEngine<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WireEngine")
            .field("config", &self.config)
            .field("protocol", &self.catalog.read().map(MessageCatalog::version))
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
