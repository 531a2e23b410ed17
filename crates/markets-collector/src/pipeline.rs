//! 레인 구성과 실행.
//!
//! `PipelineConfig`의 하위 설정을 각 컴포넌트 생성자에 넘겨 레인을 만들고,
//! 세 레인을 동시에 실행합니다. 레인끼리 공유하는 것은 저장소 연결 풀과
//! 취소 토큰뿐입니다.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::lane::Lane;
use crate::retry::RetryPolicy;
use crate::stats::{LaneReport, RunSummary};
use markets_core::AssetClass;
use markets_data::{
    CryptoExtractor, CryptoTransformer, FetchClient, ForexExtractor, ForexTransformer, RecordStore,
    StocksExtractor, StocksTransformer,
};
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub type StocksLane = Lane<StocksExtractor, StocksTransformer>;
pub type CryptoLane = Lane<CryptoExtractor, CryptoTransformer>;
pub type ForexLane = Lane<ForexExtractor, ForexTransformer>;

/// 설정, 저장소, 취소 토큰을 묶은 파이프라인.
pub struct Pipeline {
    config: PipelineConfig,
    store: RecordStore,
    cancel: CancellationToken,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, store: RecordStore, cancel: CancellationToken) -> Self {
        Self {
            config,
            store,
            cancel,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.config.schedule)
    }

    fn client(&self, base_url: &str) -> Result<FetchClient> {
        Ok(FetchClient::new(base_url, self.config.http.timeout())?)
    }

    pub fn stocks_lane(&self) -> Result<StocksLane> {
        let stocks = &self.config.stocks;
        let extractor = StocksExtractor::new(self.client(&stocks.base_url)?, self.config.api_key())
            .with_request_interval(stocks.request_interval())
            .with_cancellation(self.cancel.clone());
        Ok(Lane::new(extractor, StocksTransformer::new(), stocks.symbols.clone()))
    }

    pub fn crypto_lane(&self) -> Result<CryptoLane> {
        let crypto = &self.config.crypto;
        let extractor = CryptoExtractor::new(self.client(&crypto.base_url)?)
            .with_vs_currency(&crypto.vs_currency)
            .with_endpoint(crypto.endpoint);
        let transformer = CryptoTransformer::new(&crypto.vs_currency);
        Ok(Lane::new(extractor, transformer, crypto.coin_ids.clone()))
    }

    pub fn forex_lane(&self) -> Result<ForexLane> {
        let forex = &self.config.forex;
        let extractor = ForexExtractor::new(self.client(&forex.base_url)?, &forex.base_currency);
        Ok(Lane::new(extractor, ForexTransformer::new(), forex.targets.clone()))
    }

    /// 레인 하나를 재시도 정책에 따라 실행합니다.
    ///
    /// 레인을 구성하지 못하면 (예: 잘못된 base URL) 실행 없이 `Failed` 통계를 반환합니다.
    pub async fn run_lane(&self, asset: AssetClass) -> LaneReport {
        let policy = self.retry_policy();
        let outcome = match asset {
            AssetClass::Stocks => match self.stocks_lane() {
                Ok(mut lane) => Ok(lane.run(&self.store, &policy, &self.cancel).await),
                Err(e) => Err(e),
            },
            AssetClass::Crypto => match self.crypto_lane() {
                Ok(mut lane) => Ok(lane.run(&self.store, &policy, &self.cancel).await),
                Err(e) => Err(e),
            },
            AssetClass::Forex => match self.forex_lane() {
                Ok(mut lane) => Ok(lane.run(&self.store, &policy, &self.cancel).await),
                Err(e) => Err(e),
            },
        };
        outcome.unwrap_or_else(|e| {
            error!(lane = %asset, error = %e, "레인 구성 실패");
            LaneReport::failed(asset, &e)
        })
    }

    fn is_enabled(&self, asset: AssetClass) -> bool {
        match asset {
            AssetClass::Stocks => self.config.stocks.enabled,
            AssetClass::Crypto => self.config.crypto.enabled,
            AssetClass::Forex => self.config.forex.enabled,
        }
    }

    async fn run_if_enabled(&self, asset: AssetClass) -> Option<LaneReport> {
        if !self.is_enabled(asset) {
            info!(lane = %asset, "비활성화된 레인, 건너뜀");
            return None;
        }
        Some(self.run_lane(asset).await)
    }

    /// 활성화된 레인을 동시에 실행합니다.
    pub async fn run_all(&self) -> RunSummary {
        info!("=== 파이프라인 실행 시작 ===");
        let started = Instant::now();

        let (stocks, crypto, forex) = tokio::join!(
            self.run_if_enabled(AssetClass::Stocks),
            self.run_if_enabled(AssetClass::Crypto),
            self.run_if_enabled(AssetClass::Forex),
        );

        let mut summary = RunSummary::default();
        summary.reports.extend([stocks, crypto, forex].into_iter().flatten());
        summary.elapsed = started.elapsed();
        summary.log_summary();
        summary
    }

    /// 취소될 때까지 `interval`마다 전체 레인을 실행합니다.
    ///
    /// 실행 횟수를 반환합니다.
    pub async fn run_daemon(&self, interval: Duration) -> u64 {
        info!(interval_secs = interval.as_secs(), "=== 데몬 모드 시작 ===");

        // interval은 0을 허용하지 않음
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut runs = 0u64;

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!("종료 신호 수신, 데몬 종료 중...");
                    break;
                }
                _ = ticker.tick() => {
                    runs += 1;
                    let summary = self.run_all().await;
                    if !summary.all_succeeded() {
                        warn!(
                            failed = summary.failed().count(),
                            "일부 레인 실패, 다음 주기에 다시 실행"
                        );
                    }
                    info!(
                        next_run_secs = interval.as_secs(),
                        "=== 실행 완료, 다음 실행 대기 ==="
                    );
                }
            }
        }

        runs
    }
}
