//! Response Pipeline
//!
//! 파이프라인으로 보낸 요청들의 핸들러 FIFO. 응답은 보낸 순서대로 온다.

use std::collections::VecDeque;

use tracing::debug;

use crate::bolt::{BoltError, BoltResponse, FailureMessage};

use super::super::error::{DriverError, DriverResult};
use super::handler::ResponseHandler;

/// 응답 핸들러 FIFO
///
/// RECORD는 맨 앞 핸들러에 전달되고 꺼내지 않는다. 요약 응답(SUCCESS,
/// FAILURE, IGNORED)은 맨 앞 핸들러를 해결하고 꺼낸다. FAILURE 이후의
/// IGNORED는 그 FAILURE 탓으로 기록된다.
#[derive(Debug, Default)]
pub struct ResponsePipeline {
    handlers: VecDeque<ResponseHandler>,
    last_failure: Option<FailureMessage>,
}

impl ResponsePipeline {
    /// 빈 파이프라인
    pub fn new() -> Self {
        Self::default()
    }

    /// 핸들러 추가 (요청을 보낼 때)
    pub fn enqueue(&mut self, handler: ResponseHandler) {
        self.handlers.push_back(handler);
    }

    /// 대기 중인 핸들러 수
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// 대기 중인 핸들러가 없는지 확인
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// 맨 앞 핸들러
    pub fn head(&self) -> Option<&ResponseHandler> {
        self.handlers.front()
    }

    /// 마지막 FAILURE (다음 SUCCESS까지 유지)
    pub fn last_failure(&self) -> Option<&FailureMessage> {
        self.last_failure.as_ref()
    }

    /// 응답 하나 처리
    ///
    /// 요약 응답이면 해결된 핸들러를 돌려준다.
    pub fn on_response(&mut self, response: BoltResponse) -> DriverResult<Option<ResponseHandler>> {
        let Some(head) = self.handlers.front_mut() else {
            return Err(DriverError::Bolt(BoltError::protocol(format!(
                "received {} with no pending request",
                response.name()
            ))));
        };

        if let BoltResponse::Record(record) = response {
            head.on_record(record.fields)?;
            return Ok(None);
        }

        debug!("S: {} ({})", response.name(), head.request());

        match &response {
            BoltResponse::Success(_) => self.last_failure = None,
            BoltResponse::Failure(failure) => self.last_failure = Some(failure.clone()),
            _ => {}
        }
        let ignored = matches!(response, BoltResponse::Ignored);

        let Some(mut handler) = self.handlers.pop_front() else {
            return Ok(None);
        };
        handler.handle(response)?;
        if ignored {
            handler.set_ignored_due_to(self.last_failure.clone());
        }
        Ok(Some(handler))
    }
}
