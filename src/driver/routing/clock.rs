//! 시간 소스
//!
//! 라우팅 테이블의 나이는 주입된 [`Clock`]으로 잰다.

use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// 단조 시간 소스
pub trait Clock: Send + Sync + fmt::Debug {
    /// 현재 시각
    fn now(&self) -> Instant;
}

/// 실제 시간
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// 수동으로 움직이는 시계 (테스트용)
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    /// 현재 실제 시각에서 시작
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    /// 시간 진행
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}
