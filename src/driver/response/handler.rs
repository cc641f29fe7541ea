//! Response Handler
//!
//! 요청 하나에 대한 응답 상태 기계. `Pending`에서 SUCCESS, FAILURE, IGNORED
//! 중 하나로 정확히 한 번 전이한다.

use std::fmt;

use crate::bolt::{BoltResponse, FailureMessage, Metadata, PackStreamValue};

use super::super::error::{DriverError, DriverResult};
use super::collector::{Collected, DynCollector, MetadataCollector};

/// 핸들러 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerState {
    /// 응답 대기 중
    Pending,
    /// SUCCESS 수신
    Succeeded,
    /// FAILURE 수신
    Failed,
    /// IGNORED 수신
    Ignored,
}

impl HandlerState {
    /// 상태 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Ignored => "Ignored",
        }
    }
}

impl fmt::Display for HandlerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ResponseHandler - 응답 핸들러
// ============================================================================

/// 요청 하나의 응답 핸들러
///
/// SUCCESS가 오면 등록된 수집기를 등록 순서대로 실행하고, 결과는
/// [`Collected`]에 쌓는다. 스트리밍 PULL의 RECORD는 해결 전까지 버퍼링한다.
pub struct ResponseHandler {
    request: &'static str,
    state: HandlerState,
    collectors: Vec<Box<dyn DynCollector>>,
    collected: Collected,
    records: Vec<Vec<PackStreamValue>>,
    failure: Option<FailureMessage>,
    ignored_due_to: Option<FailureMessage>,
}

impl ResponseHandler {
    /// `request`(예: "ROUTE")에 대한 핸들러
    pub fn new(request: &'static str) -> Self {
        Self {
            request,
            state: HandlerState::Pending,
            collectors: Vec::new(),
            collected: Collected::new(),
            records: Vec::new(),
            failure: None,
            ignored_due_to: None,
        }
    }

    /// 수집기 등록 (빌더)
    pub fn with_collector<C>(mut self, collector: C) -> Self
    where
        C: MetadataCollector + Send + Sync + 'static,
        C::Output: Send + Sync + 'static,
    {
        self.add_collector(collector);
        self
    }

    /// 수집기 등록
    pub fn add_collector<C>(&mut self, collector: C)
    where
        C: MetadataCollector + Send + Sync + 'static,
        C::Output: Send + Sync + 'static,
    {
        self.collectors.push(Box::new(collector));
    }

    /// 요청 이름
    pub fn request(&self) -> &'static str {
        self.request
    }

    /// 현재 상태
    pub fn state(&self) -> HandlerState {
        self.state
    }

    /// 해결 여부
    pub fn is_resolved(&self) -> bool {
        self.state != HandlerState::Pending
    }

    /// 등록된 수집기의 메타데이터 키 (등록 순서)
    pub fn collector_keys(&self) -> Vec<&'static str> {
        self.collectors.iter().map(|c| c.key()).collect()
    }

    fn resolve(&mut self, next: HandlerState, received: &'static str) -> DriverResult<()> {
        if self.state != HandlerState::Pending {
            return Err(DriverError::DoubleResponse {
                state: self.state.as_str(),
                received,
            });
        }
        self.state = next;
        Ok(())
    }

    /// SUCCESS 처리
    ///
    /// 수집기 에러가 나면 그 에러를 돌려주지만 상태는 `Succeeded`로 남는다.
    pub fn on_success(&mut self, metadata: &Metadata) -> DriverResult<()> {
        self.resolve(HandlerState::Succeeded, "SUCCESS")?;
        for collector in &self.collectors {
            collector.collect_into(metadata, &mut self.collected)?;
        }
        Ok(())
    }

    /// RECORD 처리
    pub fn on_record(&mut self, fields: Vec<PackStreamValue>) -> DriverResult<()> {
        if self.state != HandlerState::Pending {
            return Err(DriverError::DoubleResponse {
                state: self.state.as_str(),
                received: "RECORD",
            });
        }
        self.records.push(fields);
        Ok(())
    }

    /// FAILURE 처리
    pub fn on_failure(&mut self, failure: FailureMessage) -> DriverResult<()> {
        self.resolve(HandlerState::Failed, "FAILURE")?;
        self.failure = Some(failure);
        Ok(())
    }

    /// IGNORED 처리
    pub fn on_ignored(&mut self) -> DriverResult<()> {
        self.resolve(HandlerState::Ignored, "IGNORED")
    }

    pub(crate) fn set_ignored_due_to(&mut self, failure: Option<FailureMessage>) {
        self.ignored_due_to = failure;
    }

    /// 응답 하나를 종류에 맞게 처리
    pub fn handle(&mut self, response: BoltResponse) -> DriverResult<()> {
        match response {
            BoltResponse::Success(success) => self.on_success(&success.metadata),
            BoltResponse::Record(record) => self.on_record(record.fields),
            BoltResponse::Failure(failure) => self.on_failure(failure),
            BoltResponse::Ignored => self.on_ignored(),
        }
    }

    /// 수집 결과
    pub fn collected(&self) -> &Collected {
        &self.collected
    }

    /// 수집기 `C`의 결과
    pub fn get<C>(&self) -> Option<&C::Output>
    where
        C: MetadataCollector + 'static,
        C::Output: 'static,
    {
        self.collected.get::<C>()
    }

    /// 수집기 `C`의 결과를 꺼낸다
    pub fn take<C>(&mut self) -> Option<C::Output>
    where
        C: MetadataCollector + 'static,
        C::Output: 'static,
    {
        self.collected.take::<C>()
    }

    /// 버퍼링된 레코드
    pub fn records(&self) -> &[Vec<PackStreamValue>] {
        &self.records
    }

    /// 버퍼링된 레코드를 꺼낸다
    pub fn take_records(&mut self) -> Vec<Vec<PackStreamValue>> {
        std::mem::take(&mut self.records)
    }

    /// FAILURE 내용
    pub fn failure(&self) -> Option<&FailureMessage> {
        self.failure.as_ref()
    }

    /// IGNORED의 원인이 된 앞선 FAILURE
    pub fn ignored_due_to(&self) -> Option<&FailureMessage> {
        self.ignored_due_to.as_ref()
    }

    /// 결과를 `Result`로
    ///
    /// FAILURE는 서버 코드와 메시지 그대로, IGNORED는 원인 FAILURE가 있으면 그것을 돌려준다.
    pub fn result(&self) -> DriverResult<()> {
        match self.state {
            HandlerState::Succeeded => Ok(()),
            HandlerState::Failed | HandlerState::Ignored => {
                match self.failure.as_ref().or(self.ignored_due_to.as_ref()) {
                    Some(failure) => Err(DriverError::Failure(failure.clone())),
                    None => Err(DriverError::Ignored {
                        request: self.request,
                    }),
                }
            }
            HandlerState::Pending => Err(DriverError::Bolt(crate::bolt::BoltError::protocol(
                format!("{} has not received a response yet", self.request),
            ))),
        }
    }
}

impl fmt::Debug for ResponseHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseHandler")
            .field("request", &self.request)
            .field("state", &self.state)
            .field("collectors", &self.collector_keys())
            .field("records", &self.records.len())
            .field("failure", &self.failure)
            .finish()
    }
}
