//! 라우팅 테이블
//!
//! 클러스터의 서버 역할별 목록을 관리합니다. 테이블은 불변 값이며,
//! 서버를 제외하는 연산은 새 테이블을 만든다.

use std::fmt;
use std::time::{Duration, Instant};

use super::super::address::ServerAddress;

/// 서버 역할
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerRole {
    /// 라우팅 테이블 제공자
    Route,
    /// 쓰기 트랜잭션 처리 (리더)
    Write,
    /// 읽기 트랜잭션 처리 (팔로워)
    Read,
}

impl ServerRole {
    /// ROUTE 응답의 역할 문자열 파싱
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ROUTE" => Some(Self::Route),
            "WRITE" => Some(Self::Write),
            "READ" => Some(Self::Read),
            _ => None,
        }
    }

    /// 역할을 문자열로 변환
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Route => "ROUTE",
            Self::Write => "WRITE",
            Self::Read => "READ",
        }
    }
}

// ============================================================================
// RoutingInfo - ROUTE 응답 내용
// ============================================================================

/// ROUTE 응답의 `rt` 메타데이터에서 읽은 내용
///
/// 서버 순서와 중복은 응답 그대로 유지된다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingInfo {
    /// TTL (초)
    pub ttl: Duration,
    /// 데이터베이스 이름 (4.3 응답에는 없음)
    pub database: Option<String>,
    /// 라우터 목록
    pub routers: Vec<ServerAddress>,
    /// 리더 목록
    pub readers: Vec<ServerAddress>,
    /// 라이터 목록
    pub writers: Vec<ServerAddress>,
}

// ============================================================================
// RoutingTable - 라우팅 테이블
// ============================================================================

/// 라우팅 테이블
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTable {
    /// 데이터베이스 이름 (빈 문자열은 기본 데이터베이스)
    pub database: String,
    /// TTL
    pub ttl: Duration,
    /// 라우터 목록 (라우팅 테이블 조회용)
    pub routers: Vec<ServerAddress>,
    /// 리더 목록 (읽기 트랜잭션용)
    pub readers: Vec<ServerAddress>,
    /// 라이터 목록 (쓰기 트랜잭션용)
    pub writers: Vec<ServerAddress>,
    /// 수신 시각
    pub received_at: Instant,
}

impl RoutingTable {
    /// ROUTE 응답으로 테이블 생성
    ///
    /// 응답에 데이터베이스 이름이 없으면 요청한 이름을 쓴다.
    pub fn from_info(info: RoutingInfo, requested_database: &str, received_at: Instant) -> Self {
        Self {
            database: info.database.unwrap_or_else(|| requested_database.to_string()),
            ttl: info.ttl,
            routers: info.routers,
            readers: info.readers,
            writers: info.writers,
            received_at,
        }
    }

    /// `now` 시점에 TTL이 지났는지 확인
    pub fn is_stale_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.received_at) >= self.ttl
    }

    /// TTL이 지난 뒤 `delay` 이상 더 지났는지 확인
    pub fn is_expired_for(&self, delay: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.received_at) >= self.ttl.saturating_add(delay)
    }

    /// 만료 시각 (`Instant`로 표현할 수 없을 만큼 먼 TTL이면 `None`)
    pub fn expires_at(&self) -> Option<Instant> {
        self.received_at.checked_add(self.ttl)
    }

    /// 쓰기 가능한 서버가 있는지 확인
    pub fn has_writers(&self) -> bool {
        !self.writers.is_empty()
    }

    /// 읽기 가능한 서버가 있는지 확인
    pub fn has_readers(&self) -> bool {
        !self.readers.is_empty()
    }

    /// 라우터가 있는지 확인
    pub fn has_routers(&self) -> bool {
        !self.routers.is_empty()
    }

    /// 역할별 서버 목록
    pub fn servers(&self, role: ServerRole) -> &[ServerAddress] {
        match role {
            ServerRole::Route => &self.routers,
            ServerRole::Read => &self.readers,
            ServerRole::Write => &self.writers,
        }
    }

    /// 모든 역할의 서버 (중복 제거, 처음 등장한 순서)
    pub fn all_servers(&self) -> Vec<ServerAddress> {
        let mut all: Vec<ServerAddress> = Vec::new();
        for address in self.routers.iter().chain(&self.readers).chain(&self.writers) {
            if !all.contains(address) {
                all.push(address.clone());
            }
        }
        all
    }

    /// 모든 역할에서 서버를 뺀 새 테이블
    pub fn without_server(&self, address: &ServerAddress) -> Self {
        let keep = |list: &[ServerAddress]| list.iter().filter(|a| *a != address).cloned().collect();
        Self {
            routers: keep(&self.routers),
            readers: keep(&self.readers),
            writers: keep(&self.writers),
            ..self.clone()
        }
    }

    /// 라이터 목록에서만 서버를 뺀 새 테이블
    pub fn without_writer(&self, address: &ServerAddress) -> Self {
        Self {
            writers: self.writers.iter().filter(|a| *a != address).cloned().collect(),
            ..self.clone()
        }
    }
}

impl fmt::Display for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, servers: &[ServerAddress]) -> fmt::Result {
            for (i, server) in servers.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", server)?;
            }
            Ok(())
        }

        let database = if self.database.is_empty() {
            "default database"
        } else {
            &self.database
        };
        write!(f, "RoutingTable{{database={}, routers=[", database)?;
        list(f, &self.routers)?;
        write!(f, "], writers=[")?;
        list(f, &self.writers)?;
        write!(f, "], readers=[")?;
        list(f, &self.readers)?;
        write!(f, "], expiresAfter={}s}}", self.ttl.as_secs())
    }
}
