//! Metadata Collectors
//!
//! SUCCESS 메타데이터에서 키 하나(또는 관련 키 몇 개)를 읽어 타입 있는 값으로
//! 만든다. 수집기는 상태가 없고, 결과는 [`Collected`]에 저장된다.
//!
//! 키가 없으면 `Ok(None)`, 키가 있는데 형태가 틀리면 에러다.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::bolt::message::{Notification, QueryPlan, QueryStats};
use crate::bolt::{BoltError, Metadata, PackStreamValue};

use super::super::address::ServerAddress;
use super::super::error::{DriverError, DriverResult};
use super::super::routing::{RoutingInfo, ServerRole};

// ============================================================================
// MetadataCollector - 수집기 트레이트
// ============================================================================

/// SUCCESS 메타데이터 수집기
pub trait MetadataCollector {
    /// 수집 결과 타입
    type Output;

    /// 주로 읽는 메타데이터 키
    fn key(&self) -> &'static str;

    /// 메타데이터에서 값을 읽는다
    fn collect(&self, metadata: &Metadata) -> DriverResult<Option<Self::Output>>;
}

/// 핸들러에 등록하기 위한 타입 소거 수집기
pub(crate) trait DynCollector: Send + Sync {
    fn key(&self) -> &'static str;
    fn collect_into(&self, metadata: &Metadata, out: &mut Collected) -> DriverResult<()>;
}

impl<C> DynCollector for C
where
    C: MetadataCollector + Send + Sync + 'static,
    C::Output: Send + Sync + 'static,
{
    fn key(&self) -> &'static str {
        MetadataCollector::key(self)
    }

    fn collect_into(&self, metadata: &Metadata, out: &mut Collected) -> DriverResult<()> {
        if let Some(value) = self.collect(metadata)? {
            out.insert::<C>(value);
        }
        Ok(())
    }
}

// ============================================================================
// Collected - 수집 결과 저장소
// ============================================================================

/// 수집기 타입별 결과 저장소
#[derive(Default)]
pub struct Collected {
    values: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Collected {
    /// 빈 저장소
    pub fn new() -> Self {
        Self::default()
    }

    /// 수집기 `C`의 결과
    pub fn get<C>(&self) -> Option<&C::Output>
    where
        C: MetadataCollector + 'static,
        C::Output: 'static,
    {
        self.values
            .get(&TypeId::of::<C>())
            .and_then(|value| value.downcast_ref::<C::Output>())
    }

    /// 수집기 `C`의 결과를 꺼낸다
    pub fn take<C>(&mut self) -> Option<C::Output>
    where
        C: MetadataCollector + 'static,
        C::Output: 'static,
    {
        let value = self.values.remove(&TypeId::of::<C>())?;
        value.downcast::<C::Output>().ok().map(|boxed| *boxed)
    }

    /// 저장된 결과 수
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 비어 있는지 확인
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn insert<C>(&mut self, value: C::Output)
    where
        C: MetadataCollector + 'static,
        C::Output: Send + Sync + 'static,
    {
        self.values.insert(TypeId::of::<C>(), Box::new(value));
    }
}

impl std::fmt::Debug for Collected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collected").field("len", &self.values.len()).finish()
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn wrong_type(key: &str, expected: &str, got: &PackStreamValue) -> DriverError {
    DriverError::invalid_metadata(
        key,
        format!("expected {}, got {}", expected, got.type_name()),
    )
}

fn from_protocol(key: &str, err: BoltError) -> DriverError {
    match err {
        BoltError::Protocol(message) => DriverError::invalid_metadata(key, message),
        other => DriverError::invalid_metadata(key, other.to_string()),
    }
}

fn get_int(metadata: &Metadata, key: &'static str) -> DriverResult<Option<i64>> {
    match metadata.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_int()
            .map(Some)
            .ok_or_else(|| wrong_type(key, "Integer", value)),
    }
}

fn get_str(metadata: &Metadata, key: &'static str) -> DriverResult<Option<String>> {
    match metadata.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| wrong_type(key, "String", value)),
    }
}

fn get_map<'a>(metadata: &'a Metadata, key: &'static str) -> DriverResult<Option<&'a Metadata>> {
    match metadata.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_map()
            .map(Some)
            .ok_or_else(|| wrong_type(key, "Map", value)),
    }
}

fn get_millis(metadata: &Metadata, key: &'static str) -> DriverResult<Option<Duration>> {
    match get_int(metadata, key)? {
        None => Ok(None),
        Some(ms) if ms < 0 => Err(DriverError::invalid_metadata(
            key,
            format!("negative duration {}", ms),
        )),
        Some(ms) => Ok(Some(Duration::from_millis(ms as u64))),
    }
}

// ============================================================================
// RoutingTableCollector - "rt"
// ============================================================================

/// ROUTE 응답의 라우팅 테이블 수집기
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutingTableCollector;

impl RoutingTableCollector {
    const KEY: &'static str = "rt";

    fn addresses(server: &Metadata) -> DriverResult<Vec<ServerAddress>> {
        let list = match server.get("addresses") {
            Some(PackStreamValue::List(list)) => list,
            Some(other) => return Err(wrong_type("rt.servers.addresses", "List", other)),
            None => {
                return Err(DriverError::invalid_metadata(
                    "rt.servers",
                    "server entry without 'addresses'",
                ))
            }
        };
        list.iter()
            .map(|value| {
                let s = value
                    .as_str()
                    .ok_or_else(|| wrong_type("rt.servers.addresses", "String", value))?;
                ServerAddress::parse(s).map_err(|e| {
                    DriverError::invalid_metadata("rt.servers.addresses", e.to_string())
                })
            })
            .collect()
    }
}

impl MetadataCollector for RoutingTableCollector {
    type Output = RoutingInfo;

    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn collect(&self, metadata: &Metadata) -> DriverResult<Option<RoutingInfo>> {
        let Some(rt) = get_map(metadata, Self::KEY)? else {
            return Ok(None);
        };

        let ttl = match get_int(rt, "ttl")? {
            Some(ttl) if ttl >= 0 => Duration::from_secs(ttl as u64),
            Some(ttl) => {
                return Err(DriverError::invalid_metadata("rt.ttl", format!("negative ttl {}", ttl)))
            }
            None => return Err(DriverError::invalid_metadata("rt", "missing 'ttl'")),
        };

        let database = match rt.get("db") {
            None | Some(PackStreamValue::Null) => None,
            Some(value) => Some(
                value
                    .as_str()
                    .ok_or_else(|| wrong_type("rt.db", "String", value))?
                    .to_string(),
            ),
        };

        let servers = match rt.get("servers") {
            Some(PackStreamValue::List(list)) => list,
            Some(other) => return Err(wrong_type("rt.servers", "List", other)),
            None => return Err(DriverError::invalid_metadata("rt", "missing 'servers'")),
        };

        let mut info = RoutingInfo {
            ttl,
            database,
            routers: Vec::new(),
            readers: Vec::new(),
            writers: Vec::new(),
        };

        for server in servers {
            let server = server
                .as_map()
                .ok_or_else(|| wrong_type("rt.servers", "Map", server))?;
            let role = match server.get("role") {
                Some(value) => value
                    .as_str()
                    .ok_or_else(|| wrong_type("rt.servers.role", "String", value))?,
                None => {
                    return Err(DriverError::invalid_metadata(
                        "rt.servers",
                        "server entry without 'role'",
                    ))
                }
            };
            let addresses = Self::addresses(server)?;
            match ServerRole::parse(role) {
                Some(ServerRole::Route) => info.routers.extend(addresses),
                Some(ServerRole::Read) => info.readers.extend(addresses),
                Some(ServerRole::Write) => info.writers.extend(addresses),
                None => debug!("Skipping unknown server role '{}' in routing table", role),
            }
        }

        Ok(Some(info))
    }
}

// ============================================================================
// Simple collectors
// ============================================================================

/// 북마크 수집기
#[derive(Debug, Clone, Copy, Default)]
pub struct BookmarkCollector;

impl MetadataCollector for BookmarkCollector {
    type Output = String;

    fn key(&self) -> &'static str {
        "bookmark"
    }

    fn collect(&self, metadata: &Metadata) -> DriverResult<Option<String>> {
        get_str(metadata, "bookmark")
    }
}

/// 결과 컬럼 이름 수집기
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldsCollector;

impl MetadataCollector for FieldsCollector {
    type Output = Vec<String>;

    fn key(&self) -> &'static str {
        "fields"
    }

    fn collect(&self, metadata: &Metadata) -> DriverResult<Option<Vec<String>>> {
        match metadata.get("fields") {
            None => Ok(None),
            Some(value) => value
                .as_string_list()
                .map(Some)
                .ok_or_else(|| wrong_type("fields", "List<String>", value)),
        }
    }
}

/// 명시적 트랜잭션 안의 쿼리 ID 수집기
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryIdCollector;

impl MetadataCollector for QueryIdCollector {
    type Output = i64;

    fn key(&self) -> &'static str {
        "qid"
    }

    fn collect(&self, metadata: &Metadata) -> DriverResult<Option<i64>> {
        get_int(metadata, "qid")
    }
}

/// PULL/DISCARD 후 남은 레코드 여부 수집기
#[derive(Debug, Clone, Copy, Default)]
pub struct HasMoreCollector;

impl MetadataCollector for HasMoreCollector {
    type Output = bool;

    fn key(&self) -> &'static str {
        "has_more"
    }

    fn collect(&self, metadata: &Metadata) -> DriverResult<Option<bool>> {
        match metadata.get("has_more") {
            None => Ok(None),
            Some(value) => value
                .as_bool()
                .map(Some)
                .ok_or_else(|| wrong_type("has_more", "Boolean", value)),
        }
    }
}

/// 쿼리를 실행한 데이터베이스 수집기
#[derive(Debug, Clone, Copy, Default)]
pub struct DatabaseCollector;

impl MetadataCollector for DatabaseCollector {
    type Output = String;

    fn key(&self) -> &'static str {
        "db"
    }

    fn collect(&self, metadata: &Metadata) -> DriverResult<Option<String>> {
        get_str(metadata, "db")
    }
}

/// 변경 통계 수집기
#[derive(Debug, Clone, Copy, Default)]
pub struct CountersCollector;

impl MetadataCollector for CountersCollector {
    type Output = QueryStats;

    fn key(&self) -> &'static str {
        "stats"
    }

    fn collect(&self, metadata: &Metadata) -> DriverResult<Option<QueryStats>> {
        match get_map(metadata, "stats")? {
            None => Ok(None),
            Some(map) => QueryStats::from_map(map)
                .map(Some)
                .map_err(|e| from_protocol("stats", e)),
        }
    }
}

/// 첫 레코드까지 걸린 시간 수집기 (밀리초)
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeToFirstCollector;

impl MetadataCollector for TimeToFirstCollector {
    type Output = Duration;

    fn key(&self) -> &'static str {
        "t_first"
    }

    fn collect(&self, metadata: &Metadata) -> DriverResult<Option<Duration>> {
        get_millis(metadata, "t_first")
    }
}

/// 마지막 레코드까지 걸린 시간 수집기 (밀리초)
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeToLastCollector;

impl MetadataCollector for TimeToLastCollector {
    type Output = Duration;

    fn key(&self) -> &'static str {
        "t_last"
    }

    fn collect(&self, metadata: &Metadata) -> DriverResult<Option<Duration>> {
        get_millis(metadata, "t_last")
    }
}

// ============================================================================
// QueryTypeCollector - "type"
// ============================================================================

/// 쿼리 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    /// 읽기 전용 (`r`)
    ReadOnly,
    /// 읽기/쓰기 (`rw`)
    ReadWrite,
    /// 쓰기 전용 (`w`)
    WriteOnly,
    /// 스키마 변경 (`s`)
    SchemaWrite,
}

impl QueryType {
    /// 서버 코드 파싱
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "r" => Some(Self::ReadOnly),
            "rw" => Some(Self::ReadWrite),
            "w" => Some(Self::WriteOnly),
            "s" => Some(Self::SchemaWrite),
            _ => None,
        }
    }

    /// 서버 코드
    pub fn code(&self) -> &'static str {
        match self {
            Self::ReadOnly => "r",
            Self::ReadWrite => "rw",
            Self::WriteOnly => "w",
            Self::SchemaWrite => "s",
        }
    }
}

/// 쿼리 종류 수집기
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryTypeCollector;

impl MetadataCollector for QueryTypeCollector {
    type Output = QueryType;

    fn key(&self) -> &'static str {
        "type"
    }

    fn collect(&self, metadata: &Metadata) -> DriverResult<Option<QueryType>> {
        match get_str(metadata, "type")? {
            None => Ok(None),
            Some(code) => QueryType::parse(&code).map(Some).ok_or_else(|| {
                DriverError::invalid_metadata("type", format!("unknown query type '{}'", code))
            }),
        }
    }
}

// ============================================================================
// NotificationsCollector / PlanCollector
// ============================================================================

/// 알림 수집기
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationsCollector;

impl MetadataCollector for NotificationsCollector {
    type Output = Vec<Notification>;

    fn key(&self) -> &'static str {
        "notifications"
    }

    fn collect(&self, metadata: &Metadata) -> DriverResult<Option<Vec<Notification>>> {
        let list = match metadata.get("notifications") {
            None => return Ok(None),
            Some(PackStreamValue::List(list)) => list,
            Some(other) => return Err(wrong_type("notifications", "List", other)),
        };
        list.iter()
            .map(|entry| {
                let map = entry
                    .as_map()
                    .ok_or_else(|| wrong_type("notifications", "Map", entry))?;
                Notification::from_map(map).map_err(|e| from_protocol("notifications", e))
            })
            .collect::<DriverResult<Vec<_>>>()
            .map(Some)
    }
}

/// 실행 계획 수집기
///
/// `profile`이 있으면 그것을, 없으면 `plan`을 읽는다.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanCollector;

impl MetadataCollector for PlanCollector {
    type Output = QueryPlan;

    fn key(&self) -> &'static str {
        "plan"
    }

    fn collect(&self, metadata: &Metadata) -> DriverResult<Option<QueryPlan>> {
        for key in ["profile", "plan"] {
            if let Some(value) = metadata.get(key) {
                let map = value.as_map().ok_or_else(|| wrong_type(key, "Map", value))?;
                return QueryPlan::from_map(map)
                    .map(Some)
                    .map_err(|e| from_protocol(key, e));
            }
        }
        Ok(None)
    }
}

// ============================================================================
// ServerInfoCollector - "server", "connection_id", "hints"
// ============================================================================

/// HELLO 응답의 서버 정보
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerInfo {
    /// 서버 에이전트 (예: "Neo4j/5.13.0")
    pub agent: Option<String>,
    /// 서버가 붙인 연결 ID
    pub connection_id: Option<String>,
    /// 연결 힌트
    pub hints: Metadata,
    /// 서버가 수락한 프로토콜 패치 (`patch_bolt`)
    pub patches: Vec<String>,
}

impl ServerInfo {
    /// `connection.recv_timeout_seconds` 힌트
    pub fn recv_timeout(&self) -> Option<Duration> {
        self.hints
            .get("connection.recv_timeout_seconds")
            .and_then(PackStreamValue::as_int)
            .filter(|secs| *secs > 0)
            .map(|secs| Duration::from_secs(secs as u64))
    }

    /// 패치 수락 여부 (예: "utc")
    pub fn has_patch(&self, patch: &str) -> bool {
        self.patches.iter().any(|p| p == patch)
    }
}

/// 서버 정보 수집기
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerInfoCollector;

impl MetadataCollector for ServerInfoCollector {
    type Output = ServerInfo;

    fn key(&self) -> &'static str {
        "server"
    }

    fn collect(&self, metadata: &Metadata) -> DriverResult<Option<ServerInfo>> {
        let agent = get_str(metadata, "server")?;
        let connection_id = get_str(metadata, "connection_id")?;
        let hints = get_map(metadata, "hints")?.cloned();
        let patches = match metadata.get("patch_bolt") {
            None | Some(PackStreamValue::Null) => None,
            Some(value) => Some(value.as_string_list().ok_or_else(|| {
                wrong_type("patch_bolt", "List<String>", value)
            })?),
        };

        if agent.is_none() && connection_id.is_none() && hints.is_none() && patches.is_none() {
            return Ok(None);
        }
        Ok(Some(ServerInfo {
            agent,
            connection_id,
            hints: hints.unwrap_or_default(),
            patches: patches.unwrap_or_default(),
        }))
    }
}
