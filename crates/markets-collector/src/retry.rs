//! 레인 재시도 정책.

use crate::config::ScheduleConfig;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// 실패한 레인을 다시 실행하는 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 첫 시도 이후 추가 시도 횟수
    pub max_retries: u32,
    /// 재시도 전 대기 시간
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&ScheduleConfig::default())
    }
}

impl From<&ScheduleConfig> for RetryPolicy {
    fn from(config: &ScheduleConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay: config.retry_delay(),
        }
    }
}

impl RetryPolicy {
    /// 재시도하지 않는 정책.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            retry_delay: Duration::ZERO,
        }
    }

    /// 전체 시도 횟수 (첫 시도 포함).
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// 재시도 전 대기. 취소되면 `false`를 반환합니다.
    pub async fn wait(&self, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(self.retry_delay) => true,
        }
    }
}
