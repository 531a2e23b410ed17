//! ExchangeRate-API 환율표 → `ForexRecord`.

use super::{to_decimal, Transformer};
use crate::provider::RawRates;
use chrono::{DateTime, Utc};
use markets_core::{is_currency_code, ForexRecord, RecordBatch};
use rust_decimal::Decimal;
use tracing::{error, info, warn};

/// 환율 변환기.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForexTransformer;

impl ForexTransformer {
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for ForexTransformer {
    type Raw = RawRates;
    type Record = ForexRecord;

    fn transform(&self, raw: &Self::Raw, extracted_at: DateTime<Utc>) -> RecordBatch<ForexRecord> {
        info!(base = %raw.base, count = raw.rates.len(), "환율 데이터 변환");

        let observed_at = raw
            .time_last_updated
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or(extracted_at);
        let base_currency = raw.base.trim().to_uppercase();

        let mut batch = RecordBatch::new();
        for (target, rate) in &raw.rates {
            let exchange_rate = match to_decimal(Some(rate), target) {
                Ok(Some(rate)) => rate,
                Ok(None) => {
                    warn!(target = %target, "환율 값 없음, 건너뜀");
                    continue;
                }
                Err(e) => {
                    error!(target = %target, error = %e, "환율 변환 실패, 건너뜀");
                    continue;
                }
            };
            batch.push(ForexRecord {
                base_currency: base_currency.clone(),
                target_currency: target.trim().to_uppercase(),
                exchange_rate,
                rate_date: raw.date.clone(),
                timestamp: observed_at,
                extracted_at,
            });
        }

        // 품질 검사: 통화 코드 형식, 양수 환율
        let dropped = batch.retain(|r| {
            is_currency_code(&r.base_currency)
                && is_currency_code(&r.target_currency)
                && r.exchange_rate > Decimal::ZERO
        });
        if dropped > 0 {
            warn!(dropped, "잘못된 통화 코드 또는 0 이하 환율 행 제거");
        }

        if batch.is_empty() {
            warn!("변환된 환율 데이터가 없습니다");
        } else {
            info!(count = batch.len(), "환율 변환 완료");
        }
        batch
    }
}
