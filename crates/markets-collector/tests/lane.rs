//! 가짜 추출기로 레인 상태 전이를 확인합니다.

use async_trait::async_trait;
use markets_collector::{Lane, LaneState, RetryPolicy};
use chrono::Utc;
use markets_core::{AssetClass, ForexRecord};
use markets_data::{Extractor, ForexTransformer, RawRates, RecordStore};
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// 미리 정해 둔 환율표를 돌려주는 추출기.
struct FixedRates {
    rates: Option<RawRates>,
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

#[async_trait]
impl Extractor for FixedRates {
    type Raw = RawRates;

    fn asset(&self) -> AssetClass {
        AssetClass::Forex
    }

    async fn extract(&self, _identifiers: &[String]) -> Option<RawRates> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.rates.clone()
    }
}

fn usd_rates(pairs: Vec<(&str, serde_json::Value)>) -> RawRates {
    RawRates {
        base: "USD".to_string(),
        date: None,
        time_last_updated: None,
        rates: pairs.into_iter().map(|(c, v)| (c.to_string(), v)).collect(),
    }
}

async fn store(with_tables: bool) -> RecordStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let store = RecordStore::from_pool(pool);
    if with_tables {
        store.create_tables().await.unwrap();
    }
    store
}

fn lane(rates: Option<RawRates>) -> (Lane<FixedRates, ForexTransformer>, Arc<AtomicUsize>) {
    slow_lane(rates, Duration::ZERO)
}

fn slow_lane(
    rates: Option<RawRates>,
    delay: Duration,
) -> (Lane<FixedRates, ForexTransformer>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let extractor = FixedRates {
        rates,
        calls: calls.clone(),
        delay,
    };
    (
        Lane::new(extractor, ForexTransformer::new(), vec!["EUR".to_string()]),
        calls,
    )
}

#[tokio::test]
async fn test_successful_lane_ends_done() {
    let (mut lane, _) = lane(Some(usd_rates(vec![("EUR", json!(0.91))])));
    let store = store(true).await;
    assert_eq!(lane.state(), LaneState::Idle);

    let report = lane
        .run(&store, &RetryPolicy::none(), &CancellationToken::new())
        .await;

    assert_eq!(lane.state(), LaneState::Done);
    assert_eq!(report.asset, AssetClass::Forex);
    assert_eq!(report.loaded, 1);
    assert_eq!(report.attempts, 1);
}

#[tokio::test]
async fn test_extracted_at_stamped_after_extraction() {
    let (mut lane, _) = slow_lane(
        Some(usd_rates(vec![("EUR", json!(0.91))])),
        Duration::from_millis(300),
    );
    let store = store(true).await;
    let started = Utc::now();

    let report = lane
        .run(&store, &RetryPolicy::none(), &CancellationToken::new())
        .await;
    assert_eq!(report.loaded, 1);

    let rows: Vec<ForexRecord> = store.fetch_rows().await.unwrap();
    let lag = rows[0].extracted_at - started;
    assert!(lag >= chrono::Duration::milliseconds(300), "lag: {}", lag);
    assert_eq!(rows[0].timestamp, rows[0].extracted_at);
}

#[tokio::test]
async fn test_nothing_extracted_ends_done() {
    let (mut lane, calls) = lane(None);
    let store = store(false).await;

    let report = lane
        .run(&store, &RetryPolicy::none(), &CancellationToken::new())
        .await;

    assert_eq!(report.state, LaneState::Done);
    assert_eq!(report.extracted, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_everything_dropped_in_transform_ends_done() {
    let (mut lane, _) = lane(Some(usd_rates(vec![("EUR", json!(-1)), ("GBP", json!("n/a"))])));
    let store = store(false).await;

    let report = lane
        .run(&store, &RetryPolicy::none(), &CancellationToken::new())
        .await;

    assert_eq!(report.state, LaneState::Done);
    assert_eq!(report.extracted, 2);
    assert_eq!(report.transformed, 0);
}

#[tokio::test]
async fn test_cancelled_retry_stops_early() {
    let (mut lane, calls) = lane(Some(usd_rates(vec![("EUR", json!(0.91))])));
    let store = store(false).await;
    let cancel = CancellationToken::new();
    cancel.cancel();
    let policy = RetryPolicy {
        max_retries: 5,
        retry_delay: Duration::from_secs(3600),
    };

    let report = lane.run(&store, &policy, &cancel).await;

    assert_eq!(report.state, LaneState::Failed);
    assert_eq!(report.attempts, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
