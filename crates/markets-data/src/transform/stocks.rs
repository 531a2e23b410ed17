//! Alpha Vantage `GLOBAL_QUOTE` → `StockRecord`.

use super::{decimal_from_str, to_decimal, to_volume, Transformer};
use crate::error::Result;
use crate::provider::RawQuote;
use chrono::{DateTime, Utc};
use markets_core::{RecordBatch, StockRecord};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{error, info, warn};

/// 번호가 붙은 `GLOBAL_QUOTE` 필드 이름.
mod field {
    pub const SYMBOL: &str = "01. symbol";
    pub const OPEN: &str = "02. open";
    pub const HIGH: &str = "03. high";
    pub const LOW: &str = "04. low";
    pub const PRICE: &str = "05. price";
    pub const VOLUME: &str = "06. volume";
    pub const LATEST_TRADING_DAY: &str = "07. latest trading day";
    pub const PREVIOUS_CLOSE: &str = "08. previous close";
    pub const CHANGE: &str = "09. change";
    pub const CHANGE_PERCENT: &str = "10. change percent";
}

/// 주식 변환기.
#[derive(Debug, Clone, Copy, Default)]
pub struct StocksTransformer;

impl StocksTransformer {
    pub fn new() -> Self {
        Self
    }
}

/// 품질 검사 전 매핑 결과.
#[derive(Debug)]
struct StockDraft {
    symbol: Option<String>,
    price: Option<Decimal>,
    open: Option<Decimal>,
    high: Option<Decimal>,
    low: Option<Decimal>,
    volume: Option<i64>,
    latest_trading_day: Option<String>,
    previous_close: Option<Decimal>,
    change: Option<Decimal>,
    change_percent: Decimal,
}

impl StockDraft {
    fn from_quote(raw: &RawQuote) -> Result<Self> {
        let q = &raw.quote;
        let symbol = Some(raw.symbol.trim())
            .filter(|s| !s.is_empty())
            .or_else(|| q.get(field::SYMBOL).and_then(Value::as_str).map(str::trim))
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Self {
            symbol,
            price: to_decimal(q.get(field::PRICE), field::PRICE)?,
            open: to_decimal(q.get(field::OPEN), field::OPEN)?,
            high: to_decimal(q.get(field::HIGH), field::HIGH)?,
            low: to_decimal(q.get(field::LOW), field::LOW)?,
            volume: to_volume(q.get(field::VOLUME), field::VOLUME)?,
            latest_trading_day: q
                .get(field::LATEST_TRADING_DAY)
                .and_then(Value::as_str)
                .map(str::to_string),
            previous_close: to_decimal(q.get(field::PREVIOUS_CLOSE), field::PREVIOUS_CLOSE)?,
            change: to_decimal(q.get(field::CHANGE), field::CHANGE)?,
            change_percent: parse_change_percent(q.get(field::CHANGE_PERCENT)),
        })
    }

    /// 필수 필드(symbol, price) 확인 후 선택 필드를 0으로 채웁니다.
    fn into_record(self, extracted_at: DateTime<Utc>) -> Option<StockRecord> {
        Some(StockRecord {
            symbol: self.symbol?,
            price: self.price?,
            open: self.open.unwrap_or_default(),
            high: self.high.unwrap_or_default(),
            low: self.low.unwrap_or_default(),
            volume: self.volume.unwrap_or_default(),
            latest_trading_day: self.latest_trading_day,
            previous_close: self.previous_close.unwrap_or_default(),
            change: self.change.unwrap_or_default(),
            change_percent: self.change_percent,
            timestamp: extracted_at,
            extracted_at,
        })
    }
}

/// `"1.23%"` → `1.23`. 파싱할 수 없으면 0.
pub fn parse_change_percent(value: Option<&Value>) -> Decimal {
    let parsed = match value {
        Some(Value::String(s)) => decimal_from_str(s.trim().trim_end_matches('%')),
        Some(Value::Number(n)) => decimal_from_str(&n.to_string()),
        _ => None,
    };
    parsed.unwrap_or_default()
}

impl Transformer for StocksTransformer {
    type Raw = Vec<RawQuote>;
    type Record = StockRecord;

    fn transform(&self, raw: &Self::Raw, extracted_at: DateTime<Utc>) -> RecordBatch<StockRecord> {
        info!(count = raw.len(), "주식 데이터 변환");

        let mut drafts = Vec::with_capacity(raw.len());
        for quote in raw {
            match StockDraft::from_quote(quote) {
                Ok(draft) => drafts.push(draft),
                Err(e) => error!(symbol = %quote.symbol, error = %e, "주식 변환 실패, 건너뜀"),
            }
        }

        let mapped = drafts.len();
        let batch: RecordBatch<StockRecord> = drafts
            .into_iter()
            .filter_map(|d| d.into_record(extracted_at))
            .collect();

        if batch.len() < mapped {
            warn!(dropped = mapped - batch.len(), "symbol/price 누락 행 제거");
        }
        if batch.is_empty() {
            warn!("변환된 주식 데이터가 없습니다");
        } else {
            info!(count = batch.len(), "주식 변환 완료");
        }
        batch
    }
}
