//! Driver Error Types
//!
//! 응답 처리와 라우팅 계층의 에러 정의

use thiserror::Error;

use crate::bolt::{BoltError, FailureMessage};

/// 드라이버 결과 타입
pub type DriverResult<T> = Result<T, DriverError>;

// ============================================================================
// DriverError - 드라이버 에러
// ============================================================================

/// 드라이버 에러
#[derive(Error, Debug)]
pub enum DriverError {
    /// 와이어 계층 에러 (코덱, 핸드셰이크, 전송)
    #[error("Bolt error: {0}")]
    Bolt(#[from] BoltError),

    /// 이미 응답을 받은 핸들러에 두 번째 응답 도착
    #[error("Double response: handler already {state}, received {received}")]
    DoubleResponse {
        /// 핸들러의 현재 상태
        state: &'static str,
        /// 새로 도착한 응답 이름
        received: &'static str,
    },

    /// 서버 FAILURE 응답 (코드와 메시지 그대로)
    #[error("Server failure: {0}")]
    Failure(FailureMessage),

    /// 앞선 실패 때문에 서버가 요청을 무시함 (IGNORED)
    #[error("{request} was ignored by the server")]
    Ignored {
        /// 무시된 요청 이름
        request: &'static str,
    },

    /// 라우팅 테이블을 얻을 수 없음
    #[error("Routing unavailable for database '{database}': {reason}")]
    RoutingUnavailable {
        /// 데이터베이스 이름
        database: String,
        /// 원인
        reason: String,
    },

    /// 메타데이터 값의 형태가 잘못됨
    #[error("Invalid metadata for '{key}': {message}")]
    InvalidMetadata {
        /// 메타데이터 키
        key: String,
        /// 상세 메시지
        message: String,
    },

    /// 설정 에러
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 타임아웃
    #[error("Timeout: {0}")]
    Timeout(String),
}

impl DriverError {
    /// 라우팅 불가 에러 생성
    pub fn routing_unavailable(database: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RoutingUnavailable {
            database: database.into(),
            reason: reason.into(),
        }
    }

    /// 메타데이터 에러 생성
    pub fn invalid_metadata(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            key: key.into(),
            message: message.into(),
        }
    }

    /// 설정 에러 생성
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// 타임아웃 에러 생성
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// 재시도 가능 여부
    ///
    /// 코덱 에러는 연결을 끊어야 하므로 재시도 대상이 아니다.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RoutingUnavailable { .. } | Self::Timeout(_) => true,
            Self::Failure(failure) => failure.is_transient(),
            Self::Bolt(err) => matches!(
                err,
                BoltError::Io(_) | BoltError::Timeout | BoltError::ConnectionClosed
            ),
            _ => false,
        }
    }

    /// 서버 FAILURE 여부
    pub fn failure(&self) -> Option<&FailureMessage> {
        match self {
            Self::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    /// 라우팅 갱신을 즉시 중단해야 하는지 여부
    pub fn stops_route_discovery(&self) -> bool {
        self.failure().map_or(false, FailureMessage::stops_route_discovery)
    }
}

impl From<FailureMessage> for DriverError {
    fn from(failure: FailureMessage) -> Self {
        Self::Failure(failure)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bolt::packstream::PackStreamError;
    use crate::bolt::BoltErrorCode;

    #[test]
    fn test_driver_error_display() {
        let err = DriverError::routing_unavailable("movies", "no router answered");
        assert_eq!(
            err.to_string(),
            "Routing unavailable for database 'movies': no router answered"
        );

        let err = DriverError::DoubleResponse {
            state: "Succeeded",
            received: "SUCCESS",
        };
        assert_eq!(
            err.to_string(),
            "Double response: handler already Succeeded, received SUCCESS"
        );

        let err: DriverError = FailureMessage::new(BoltErrorCode::SYNTAX_ERROR, "bad").into();
        assert_eq!(
            err.to_string(),
            "Server failure: Neo.ClientError.Statement.SyntaxError: bad"
        );
    }

    #[test]
    fn test_driver_error_retryable() {
        assert!(DriverError::routing_unavailable("db", "x").is_retryable());
        assert!(DriverError::timeout("route").is_retryable());
        assert!(DriverError::from(BoltError::ConnectionClosed).is_retryable());

        let transient = FailureMessage::new(BoltErrorCode::DATABASE_UNAVAILABLE, "later");
        assert!(DriverError::from(transient).is_retryable());

        let syntax = FailureMessage::new(BoltErrorCode::SYNTAX_ERROR, "bad");
        assert!(!DriverError::from(syntax).is_retryable());

        let codec = BoltError::PackStream(PackStreamError::MalformedStream("x".into()));
        assert!(!DriverError::from(codec).is_retryable());
        assert!(!DriverError::invalid_metadata("rt", "not a map").is_retryable());
    }

    #[test]
    fn test_stops_route_discovery() {
        let err = DriverError::from(FailureMessage::new(BoltErrorCode::UNAUTHORIZED, "no"));
        assert!(err.stops_route_discovery());

        let err = DriverError::from(FailureMessage::new(BoltErrorCode::DATABASE_NOT_FOUND, "no"));
        assert!(err.stops_route_discovery());

        let err = DriverError::from(FailureMessage::new(BoltErrorCode::DATABASE_UNAVAILABLE, "no"));
        assert!(!err.stops_route_discovery());
        assert!(!DriverError::timeout("x").stops_route_discovery());
    }
}
