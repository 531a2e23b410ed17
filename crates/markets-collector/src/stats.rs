//! 레인 실행 통계.

use markets_core::AssetClass;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// 레인 상태.
///
/// `Idle → Extracting → Transforming → Loading → Done`, 어느 단계에서든 `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LaneState {
    #[default]
    Idle,
    Extracting,
    Transforming,
    Loading,
    Done,
    Failed,
}

impl LaneState {
    /// 더 이상 진행하지 않는 상태인지 여부.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for LaneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Extracting => "extracting",
            Self::Transforming => "transforming",
            Self::Loading => "loading",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// 레인 한 번 실행(재시도 포함)의 결과.
#[derive(Debug, Clone, Serialize)]
pub struct LaneReport {
    /// 자산군
    pub asset: AssetClass,
    /// 최종 상태
    pub state: LaneState,
    /// 추출된 원시 항목 수
    pub extracted: usize,
    /// 변환 후 남은 레코드 수
    pub transformed: usize,
    /// 저장된 행 수
    pub loaded: u64,
    /// 시도 횟수
    pub attempts: u32,
    /// 마지막 실패 메시지
    pub error: Option<String>,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl LaneReport {
    /// 새 통계 객체 생성
    pub fn new(asset: AssetClass) -> Self {
        Self {
            asset,
            state: LaneState::Idle,
            extracted: 0,
            transformed: 0,
            loaded: 0,
            attempts: 0,
            error: None,
            elapsed: Duration::ZERO,
        }
    }

    /// 실행되지 못한 레인의 실패 통계.
    pub fn failed(asset: AssetClass, error: &impl fmt::Display) -> Self {
        Self {
            state: LaneState::Failed,
            error: Some(error.to_string()),
            ..Self::new(asset)
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == LaneState::Done
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self) {
        let elapsed = format!("{:.1}s", self.elapsed.as_secs_f64());
        if self.is_success() {
            tracing::info!(
                lane = %self.asset,
                state = %self.state,
                extracted = self.extracted,
                transformed = self.transformed,
                loaded = self.loaded,
                attempts = self.attempts,
                elapsed = elapsed,
                "레인 완료"
            );
        } else {
            tracing::error!(
                lane = %self.asset,
                state = %self.state,
                extracted = self.extracted,
                transformed = self.transformed,
                attempts = self.attempts,
                error = self.error.as_deref().unwrap_or("-"),
                elapsed = elapsed,
                "레인 실패"
            );
        }
    }
}

/// 전체 실행(여러 레인) 요약.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub reports: Vec<LaneReport>,
    pub elapsed: Duration,
}

impl RunSummary {
    /// 모든 레인이 `Done`으로 끝났는지 여부.
    pub fn all_succeeded(&self) -> bool {
        self.reports.iter().all(LaneReport::is_success)
    }

    pub fn failed(&self) -> impl Iterator<Item = &LaneReport> {
        self.reports.iter().filter(|r| !r.is_success())
    }

    pub fn total_loaded(&self) -> u64 {
        self.reports.iter().map(|r| r.loaded).sum()
    }

    pub fn report(&self, asset: AssetClass) -> Option<&LaneReport> {
        self.reports.iter().find(|r| r.asset == asset)
    }

    /// 레인별 요약과 전체 합계 로그 출력
    pub fn log_summary(&self) {
        for report in &self.reports {
            report.log_summary();
        }
        tracing::info!(
            lanes = self.reports.len(),
            failed = self.failed().count(),
            loaded = self.total_loaded(),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "파이프라인 실행 완료"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(asset: AssetClass, state: LaneState, loaded: u64) -> LaneReport {
        LaneReport {
            state,
            loaded,
            ..LaneReport::new(asset)
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(LaneState::Done.is_terminal());
        assert!(LaneState::Failed.is_terminal());
        assert!(!LaneState::Loading.is_terminal());
        assert_eq!(LaneState::default(), LaneState::Idle);
    }

    #[test]
    fn test_run_summary_totals() {
        let summary = RunSummary {
            reports: vec![
                report(AssetClass::Stocks, LaneState::Done, 3),
                report(AssetClass::Crypto, LaneState::Failed, 0),
                report(AssetClass::Forex, LaneState::Done, 2),
            ],
            elapsed: Duration::from_secs(1),
        };

        assert!(!summary.all_succeeded());
        assert_eq!(summary.total_loaded(), 5);
        assert_eq!(summary.failed().count(), 1);
        assert_eq!(summary.report(AssetClass::Forex).map(|r| r.loaded), Some(2));
    }

    #[test]
    fn test_empty_summary_is_success() {
        assert!(RunSummary::default().all_succeeded());
    }
}
