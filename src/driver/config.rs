//! 엔진 설정
//!
//! 라우팅 설정([`RoutingConfig`])과 와이어 엔진 설정([`EngineConfig`]).

use std::collections::HashMap;
use std::time::Duration;

use crate::bolt::codec::DEFAULT_MAX_MESSAGE_SIZE;
use crate::bolt::BoltVersion;

use super::address::ServerAddress;
use super::error::{DriverError, DriverResult};

/// 기본 라우팅 테이블 정리 지연 시간
pub const DEFAULT_PURGE_DELAY: Duration = Duration::from_secs(30);

/// 기본 ROUTE 조회 타임아웃
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// RoutingConfig - 라우팅 설정
// ============================================================================

/// 라우팅 설정
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    /// 초기 라우터 목록 (캐시된 테이블의 라우터가 모두 실패했을 때 사용)
    pub initial_routers: Vec<ServerAddress>,
    /// ROUTE 메시지에 실을 라우팅 컨텍스트
    pub routing_context: HashMap<String, String>,
    /// TTL이 지난 뒤 테이블을 캐시에서 지우기까지의 유예 시간
    pub purge_delay: Duration,
    /// 라우터 하나에 대한 ROUTE 조회 타임아웃
    pub fetch_timeout: Duration,
}

impl RoutingConfig {
    /// 초기 라우터로 설정 생성
    pub fn new(initial_routers: Vec<ServerAddress>) -> Self {
        Self {
            initial_routers,
            ..Self::default()
        }
    }

    /// 빌더 시작
    pub fn builder() -> RoutingConfigBuilder {
        RoutingConfigBuilder {
            config: Self::default(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            initial_routers: Vec::new(),
            routing_context: HashMap::new(),
            purge_delay: DEFAULT_PURGE_DELAY,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// 라우팅 설정 빌더
#[derive(Debug)]
pub struct RoutingConfigBuilder {
    config: RoutingConfig,
}

impl RoutingConfigBuilder {
    /// 초기 라우터 추가
    pub fn with_router(mut self, router: ServerAddress) -> Self {
        self.config.initial_routers.push(router);
        self
    }

    /// 쉼표로 구분된 `host:port` 목록에서 초기 라우터 설정
    pub fn with_routers_str(mut self, routers: &str) -> DriverResult<Self> {
        for part in routers.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            self.config.initial_routers.push(ServerAddress::parse(part)?);
        }
        Ok(self)
    }

    /// 라우팅 컨텍스트 항목 추가
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.routing_context.insert(key.into(), value.into());
        self
    }

    /// 정리 지연 시간 설정
    pub fn with_purge_delay(mut self, delay: Duration) -> Self {
        self.config.purge_delay = delay;
        self
    }

    /// ROUTE 조회 타임아웃 설정
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.config.fetch_timeout = timeout;
        self
    }

    /// 빌드
    pub fn build(self) -> DriverResult<RoutingConfig> {
        if self.config.initial_routers.is_empty() {
            return Err(DriverError::configuration("No routers specified"));
        }
        Ok(self.config)
    }
}

// ============================================================================
// EngineConfig - 엔진 설정
// ============================================================================

/// 와이어 엔진 설정
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// 핸드셰이크에서 제안할 버전 (선호 순서)
    pub preferred_versions: Vec<BoltVersion>,
    /// HELLO의 user_agent
    pub user_agent: String,
    /// 수신 메시지 최대 크기 (바이트)
    pub max_message_size: usize,
    /// 4.3/4.4 연결에서 UTC 날짜 패치를 요청할지 여부
    pub utc_patch: bool,
}

impl EngineConfig {
    /// 빌더 시작
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder {
            config: Self::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            preferred_versions: BoltVersion::ALL.to_vec(),
            user_agent: format!("zeta4g-wire/{}", env!("CARGO_PKG_VERSION")),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            utc_patch: true,
        }
    }
}

/// 엔진 설정 빌더
#[derive(Debug)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// 제안할 버전 목록 설정
    pub fn with_preferred_versions(mut self, versions: Vec<BoltVersion>) -> Self {
        self.config.preferred_versions = versions;
        self
    }

    /// User Agent 설정
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// 최대 메시지 크기 설정
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.config.max_message_size = size;
        self
    }

    /// UTC 패치 요청 여부 설정
    pub fn with_utc_patch(mut self, enabled: bool) -> Self {
        self.config.utc_patch = enabled;
        self
    }

    /// 빌드
    pub fn build(self) -> DriverResult<EngineConfig> {
        if self.config.preferred_versions.is_empty() {
            return Err(DriverError::configuration("At least one Bolt version must be proposed"));
        }
        if self.config.max_message_size == 0 {
            return Err(DriverError::configuration("max_message_size must be positive"));
        }
        Ok(self.config)
    }
}
