//! 서버 주소

use std::fmt;
use std::str::FromStr;

use super::error::{DriverError, DriverResult};

/// 기본 Bolt 포트
pub const DEFAULT_PORT: u16 = 7687;

// ============================================================================
// ServerAddress - 서버 주소
// ============================================================================

/// 서버 주소
///
/// ROUTE 응답의 `"host:port"` 문자열과 설정의 초기 라우터 목록에 쓰인다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServerAddress {
    /// 호스트
    pub host: String,
    /// 포트
    pub port: u16,
}

impl ServerAddress {
    /// 새 서버 주소 생성
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `host`, `host:port`, `[v6]`, `[v6]:port` 형식 파싱
    ///
    /// `bolt://` 같은 스킴 접두사는 허용하지 않는다.
    pub fn parse(s: &str) -> DriverResult<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DriverError::configuration("Empty server address"));
        }
        if s.contains("://") {
            return Err(DriverError::configuration(format!(
                "Server address must not carry a scheme: {}",
                s
            )));
        }

        if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| DriverError::configuration(format!("Unclosed IPv6 address: {}", s)))?;
            let port = match tail {
                "" => DEFAULT_PORT,
                _ => match tail.strip_prefix(':') {
                    Some(port) => parse_port(port)?,
                    None => {
                        return Err(DriverError::configuration(format!(
                            "Invalid server address: {}",
                            s
                        )))
                    }
                },
            };
            return Ok(Self::new(host, port));
        }

        match s.split_once(':') {
            None => Ok(Self::new(s, DEFAULT_PORT)),
            Some((host, port)) if !host.is_empty() && !port.contains(':') => {
                Ok(Self::new(host, parse_port(port)?))
            }
            Some(_) => Err(DriverError::configuration(format!(
                "Invalid server address: {}",
                s
            ))),
        }
    }
}

fn parse_port(port: &str) -> DriverResult<u16> {
    port.parse()
        .map_err(|_| DriverError::configuration(format!("Invalid port: {}", port)))
}

impl FromStr for ServerAddress {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl Default for ServerAddress {
    fn default() -> Self {
        Self::new("localhost", DEFAULT_PORT)
    }
}
