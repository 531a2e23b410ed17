//! 자산군 레인: 추출 → 변환 → 적재.
//!
//! 레인은 단계를 순서대로 실행하며 `LaneState`를 전이합니다. 단계가
//! 데이터를 내놓지 못하면 경고를 남기고 이후 단계 없이 `Done`으로
//! 끝납니다. 적재 실패는 삼키지 않고 `Failed`로 전이한 뒤 에러를 반환합니다.

use crate::error::{CollectorError, Result};
use crate::retry::RetryPolicy;
use crate::stats::{LaneReport, LaneState};
use chrono::Utc;
use markets_core::{lane_span, AssetClass};
use markets_data::{Extractor, RawQuote, RawRates, RecordStore, TableRecord, Transformer};
use serde_json::Value;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};

/// 추출 결과의 항목 수.
pub trait RawItems {
    fn item_count(&self) -> usize;
}

impl RawItems for Vec<RawQuote> {
    fn item_count(&self) -> usize {
        self.len()
    }
}

impl RawItems for Vec<Value> {
    fn item_count(&self) -> usize {
        self.len()
    }
}

impl RawItems for RawRates {
    fn item_count(&self) -> usize {
        self.rates.len()
    }
}

/// 하나의 자산군을 처리하는 레인.
pub struct Lane<E, T> {
    extractor: E,
    transformer: T,
    identifiers: Vec<String>,
    state: LaneState,
}

impl<E, T> Lane<E, T>
where
    E: Extractor,
    E::Raw: RawItems,
    T: Transformer<Raw = E::Raw>,
    T::Record: TableRecord,
{
    pub fn new(extractor: E, transformer: T, identifiers: Vec<String>) -> Self {
        Self {
            extractor,
            transformer,
            identifiers,
            state: LaneState::Idle,
        }
    }

    pub fn asset(&self) -> AssetClass {
        self.extractor.asset()
    }

    pub fn state(&self) -> LaneState {
        self.state
    }

    fn transition(&mut self, next: LaneState) {
        debug!(lane = %self.asset(), from = %self.state, to = %next, "레인 상태 전이");
        self.state = next;
    }

    /// 레인을 한 번 실행합니다.
    ///
    /// 적재 실패 시 상태는 `Failed`가 되고 에러가 반환됩니다.
    /// `report`에는 실패 직전까지의 건수가 남습니다.
    pub async fn run_once(&mut self, store: &RecordStore, report: &mut LaneReport) -> Result<()> {
        self.state = LaneState::Idle;
        self.transition(LaneState::Extracting);
        let Some(raw) = self.extractor.extract(&self.identifiers).await else {
            warn!(lane = %self.asset(), "추출된 데이터 없음, 레인 종료");
            self.transition(LaneState::Done);
            return Ok(());
        };
        report.extracted = raw.item_count();
        if report.extracted == 0 {
            warn!(lane = %self.asset(), "추출된 데이터 없음, 레인 종료");
            self.transition(LaneState::Done);
            return Ok(());
        }

        self.transition(LaneState::Transforming);
        // 추출이 끝나 변환기에 넘기는 시점
        let extracted_at = Utc::now();
        let batch = self.transformer.transform(&raw, extracted_at);
        report.transformed = batch.len();
        if batch.is_empty() {
            warn!(lane = %self.asset(), "변환된 데이터 없음, 레인 종료");
            self.transition(LaneState::Done);
            return Ok(());
        }

        self.transition(LaneState::Loading);
        match store.load(&batch).await {
            Ok(loaded) => {
                report.loaded = loaded;
                self.transition(LaneState::Done);
                Ok(())
            }
            Err(e) => {
                error!(lane = %self.asset(), error = %e, "적재 실패");
                self.transition(LaneState::Failed);
                Err(CollectorError::from(e))
            }
        }
    }

    /// 재시도 정책에 따라 레인을 실행하고 최종 통계를 반환합니다.
    ///
    /// 취소 토큰이 취소되면 남은 재시도를 포기합니다.
    pub async fn run(
        &mut self,
        store: &RecordStore,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
    ) -> LaneReport {
        let asset = self.asset();
        let started = Instant::now();
        let mut report = LaneReport::new(asset);

        for attempt in 1..=policy.max_attempts() {
            let mut attempt_report = LaneReport::new(asset);
            let result = self
                .run_once(store, &mut attempt_report)
                .instrument(lane_span!(asset, attempt))
                .await;

            attempt_report.attempts = attempt;
            attempt_report.state = self.state;
            report = attempt_report;

            let err = match result {
                Ok(()) => break,
                Err(e) => e,
            };
            report.error = Some(err.to_string());

            if attempt == policy.max_attempts() || !err.is_retryable() {
                break;
            }
            info!(
                lane = %asset,
                attempt,
                delay_secs = policy.retry_delay.as_secs(),
                "레인 재시도 대기"
            );
            if !policy.wait(cancel).await {
                warn!(lane = %asset, "취소 신호로 재시도 중단");
                break;
            }
        }

        report.elapsed = started.elapsed();
        report
    }
}
