//! CoinGecko 응답 → `CryptoRecord`.
//!
//! 세 가지 응답 형태를 지원합니다. 각 항목은 먼저 [`CoinPayload`]로 분류한 뒤
//! 형태별 경로로 매핑합니다:
//! - `coins/markets` 배열 항목
//! - `simple/price` 재구성 항목 (`{id, data}`)
//! - `coins/{id}` 상세 응답 (`market_data` 포함)

use super::{first_present, parse_rfc3339, to_decimal, Transformer};
use crate::error::{DataError, Result};
use crate::provider::coingecko::DEFAULT_VS_CURRENCY;
use chrono::{DateTime, Utc};
use markets_core::{CryptoRecord, RecordBatch};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

/// 분류된 코인 항목.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoinPayload<'a> {
    /// `coins/markets` 항목
    Market(&'a Map<String, Value>),
    /// `simple/price` 항목
    SimplePrice {
        id: &'a str,
        quote: &'a Map<String, Value>,
    },
    /// `coins/{id}` 상세 응답
    Detailed {
        coin: &'a Map<String, Value>,
        market_data: &'a Map<String, Value>,
    },
}

impl<'a> CoinPayload<'a> {
    /// 형태를 구분하는 키로 항목을 분류합니다.
    ///
    /// `market_data` → 상세, `data` → 간이 시세, 그 외 객체 → markets 항목.
    pub fn classify(value: &'a Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| DataError::InvalidData(format!("코인 항목이 객체가 아닙니다: {}", value)))?;

        if let Some(market_data) = obj.get("market_data") {
            let market_data = market_data
                .as_object()
                .ok_or_else(|| DataError::InvalidData("market_data가 객체가 아닙니다".to_string()))?;
            return Ok(Self::Detailed {
                coin: obj,
                market_data,
            });
        }

        if let Some(data) = obj.get("data") {
            let quote = data
                .as_object()
                .ok_or_else(|| DataError::InvalidData("data가 객체가 아닙니다".to_string()))?;
            let id = obj.get("id").and_then(Value::as_str).unwrap_or_default();
            return Ok(Self::SimplePrice { id, quote });
        }

        Ok(Self::Market(obj))
    }

    /// 심볼/이름을 담은 객체와 코인 ID.
    fn identity(&self) -> (Option<&'a Map<String, Value>>, &'a str) {
        match *self {
            Self::Market(coin) | Self::Detailed { coin, .. } => {
                let id = coin.get("id").and_then(Value::as_str).unwrap_or_default();
                (Some(coin), id)
            }
            Self::SimplePrice { id, .. } => (None, id),
        }
    }
}

/// 암호화폐 변환기.
#[derive(Debug, Clone)]
pub struct CryptoTransformer {
    vs_currency: String,
}

impl Default for CryptoTransformer {
    fn default() -> Self {
        Self::new(DEFAULT_VS_CURRENCY)
    }
}

/// 품질 검사 전 매핑 결과.
#[derive(Debug)]
struct CryptoDraft {
    symbol: Option<String>,
    name: Option<String>,
    current_price: Option<Decimal>,
    market_cap: Option<Decimal>,
    total_volume: Option<Decimal>,
    price_change_24h: Option<Decimal>,
    observed_at: Option<DateTime<Utc>>,
}

impl CryptoDraft {
    /// 필수 필드(symbol, current_price) 확인 후 선택 수치를 0으로 채웁니다.
    fn into_record(self, extracted_at: DateTime<Utc>) -> Option<CryptoRecord> {
        let symbol = self.symbol.filter(|s| !s.is_empty())?;
        Some(CryptoRecord {
            name: self.name.unwrap_or_else(|| symbol.clone()),
            symbol,
            current_price: self.current_price?,
            market_cap: self.market_cap.unwrap_or_default(),
            total_volume: self.total_volume.unwrap_or_default(),
            price_change_24h: self.price_change_24h.unwrap_or_default(),
            timestamp: self.observed_at.unwrap_or(extracted_at),
            extracted_at,
        })
    }
}

impl CryptoTransformer {
    pub fn new(vs_currency: impl Into<String>) -> Self {
        Self {
            vs_currency: vs_currency.into().to_lowercase(),
        }
    }

    fn map_payload(&self, payload: CoinPayload<'_>) -> Result<CryptoDraft> {
        let vs = self.vs_currency.as_str();
        let (coin, id) = payload.identity();

        let text = |key: &str| coin.and_then(|c| c.get(key)).and_then(Value::as_str);

        let symbol = text("symbol").unwrap_or(id).trim().to_uppercase();
        let name = text("name")
            .map(str::to_string)
            .or_else(|| (!id.is_empty()).then(|| capitalize(id)));

        let mut draft = CryptoDraft {
            symbol: Some(symbol),
            name,
            current_price: None,
            market_cap: None,
            total_volume: None,
            price_change_24h: None,
            observed_at: parse_rfc3339(coin.and_then(|c| c.get("last_updated"))),
        };

        match payload {
            CoinPayload::Market(m) => {
                draft.current_price = to_decimal(m.get("current_price"), "current_price")?;
                draft.market_cap = to_decimal(m.get("market_cap"), "market_cap")?;
                draft.total_volume = to_decimal(m.get("total_volume"), "total_volume")?;
                draft.price_change_24h = to_decimal(
                    m.get("price_change_percentage_24h"),
                    "price_change_percentage_24h",
                )?;
            }
            CoinPayload::SimplePrice { quote, .. } => {
                let cap_key = format!("{}_market_cap", vs);
                let vol_key = format!("{}_24h_vol", vs);
                let change_key = format!("{}_24h_change", vs);
                draft.current_price =
                    to_decimal(first_present(quote, &[vs, "current_price"]), "current_price")?;
                draft.market_cap =
                    to_decimal(first_present(quote, &[cap_key.as_str(), "market_cap"]), "market_cap")?;
                draft.total_volume =
                    to_decimal(first_present(quote, &[vol_key.as_str(), "total_volume"]), "total_volume")?;
                draft.price_change_24h = to_decimal(
                    first_present(quote, &[change_key.as_str(), "price_change_percentage_24h"]),
                    "price_change_24h",
                )?;
            }
            CoinPayload::Detailed { market_data, .. } => {
                let by_vs = |key: &str| market_data.get(key).and_then(|v| v.get(vs));
                draft.current_price = to_decimal(by_vs("current_price"), "current_price")?;
                draft.market_cap = to_decimal(by_vs("market_cap"), "market_cap")?;
                draft.total_volume = to_decimal(by_vs("total_volume"), "total_volume")?;
                draft.price_change_24h = to_decimal(
                    market_data.get("price_change_percentage_24h"),
                    "price_change_percentage_24h",
                )?;
            }
        }

        Ok(draft)
    }
}

impl Transformer for CryptoTransformer {
    type Raw = Vec<Value>;
    type Record = CryptoRecord;

    fn transform(&self, raw: &Self::Raw, extracted_at: DateTime<Utc>) -> RecordBatch<CryptoRecord> {
        info!(count = raw.len(), "암호화폐 데이터 변환");

        let mut drafts = Vec::with_capacity(raw.len());
        for item in raw {
            match CoinPayload::classify(item).and_then(|p| self.map_payload(p)) {
                Ok(draft) => drafts.push(draft),
                Err(e) => error!(error = %e, "암호화폐 변환 실패, 건너뜀"),
            }
        }

        let mapped = drafts.len();
        let batch: RecordBatch<CryptoRecord> = drafts
            .into_iter()
            .filter_map(|d| d.into_record(extracted_at))
            .collect();

        if batch.len() < mapped {
            warn!(dropped = mapped - batch.len(), "symbol/current_price 누락 행 제거");
        }
        if batch.is_empty() {
            warn!("변환된 암호화폐 데이터가 없습니다");
        } else {
            info!(count = batch.len(), "암호화폐 변환 완료");
        }
        batch
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn transform(raw: Vec<Value>) -> RecordBatch<CryptoRecord> {
        CryptoTransformer::default().transform(&raw, Utc::now())
    }

    #[test]
    fn test_classify_shapes() {
        let market = json!({"id": "bitcoin", "current_price": 1});
        let simple = json!({"id": "bitcoin", "data": {"usd": 1}});
        let detailed = json!({"id": "bitcoin", "market_data": {}});

        assert!(matches!(CoinPayload::classify(&market).unwrap(), CoinPayload::Market(_)));
        assert!(matches!(
            CoinPayload::classify(&simple).unwrap(),
            CoinPayload::SimplePrice { id: "bitcoin", .. }
        ));
        assert!(matches!(
            CoinPayload::classify(&detailed).unwrap(),
            CoinPayload::Detailed { .. }
        ));
        assert!(CoinPayload::classify(&json!([1, 2])).is_err());
        assert!(CoinPayload::classify(&json!({"data": 5})).is_err());
    }

    #[test]
    fn test_markets_shape() {
        let batch = transform(vec![json!({
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "current_price": 45000,
            "market_cap": 850000000000u64,
            "total_volume": 25000000000u64,
            "price_change_percentage_24h": 2.5,
            "last_updated": "2024-01-02T10:00:00.000Z"
        })]);

        assert_eq!(batch.len(), 1);
        let row = &batch.rows()[0];
        assert_eq!(row.symbol, "BTC");
        assert_eq!(row.name, "Bitcoin");
        assert_eq!(row.current_price, dec!(45000));
        assert_eq!(row.market_cap, dec!(850000000000));
        assert_eq!(row.total_volume, dec!(25000000000));
        assert_eq!(row.price_change_24h, dec!(2.5));
        assert_eq!(row.timestamp.to_rfc3339(), "2024-01-02T10:00:00+00:00");
    }

    #[test]
    fn test_simple_price_shape_uses_id_fallbacks() {
        let batch = transform(vec![json!({
            "id": "ethereum",
            "data": {"usd": 2300.5, "usd_market_cap": 276000000000u64, "usd_24h_change": -1.2}
        })]);

        let row = &batch.rows()[0];
        assert_eq!(row.symbol, "ETHEREUM");
        assert_eq!(row.name, "Ethereum");
        assert_eq!(row.current_price, dec!(2300.5));
        assert_eq!(row.total_volume, Decimal::ZERO);
        assert_eq!(row.price_change_24h, dec!(-1.2));
        assert_eq!(row.timestamp, row.extracted_at);
    }

    #[test]
    fn test_detailed_shape() {
        let batch = transform(vec![json!({
            "id": "solana",
            "symbol": "sol",
            "name": "Solana",
            "market_data": {
                "current_price": {"usd": 98.1, "eur": 90.0},
                "market_cap": {"usd": 42000000000u64},
                "total_volume": {"usd": 1900000000u64},
                "price_change_percentage_24h": 4.2
            }
        })]);

        let row = &batch.rows()[0];
        assert_eq!(row.symbol, "SOL");
        assert_eq!(row.current_price, dec!(98.1));
        assert_eq!(row.market_cap, dec!(42000000000));
        assert_eq!(row.price_change_24h, dec!(4.2));
    }

    #[test]
    fn test_missing_current_price_is_dropped_not_defaulted() {
        let batch = transform(vec![
            json!({"id": "ghost", "symbol": "gst", "name": "Ghost"}),
            json!({"id": "ghost2", "data": {"usd_market_cap": 10}}),
            json!({"id": "ghost3", "market_data": {"current_price": {"eur": 1}}}),
            json!({"id": "real", "symbol": "rl", "current_price": 1}),
        ]);

        let symbols: Vec<_> = batch.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["RL"]);
    }

    #[test]
    fn test_malformed_items_skipped() {
        let batch = transform(vec![
            Value::Null,
            json!("bitcoin"),
            json!({"id": "bad", "symbol": "bad", "current_price": "n/a"}),
            json!({"id": "bitcoin", "symbol": "btc", "current_price": 45000}),
        ]);

        assert_eq!(batch.len(), 1);
        assert_eq!(batch.rows()[0].symbol, "BTC");
    }

    #[test]
    fn test_empty_input_yields_empty_batch() {
        assert!(transform(Vec::new()).is_empty());
    }

    #[test]
    fn test_custom_vs_currency() {
        let batch = CryptoTransformer::new("EUR").transform(
            &vec![json!({"id": "bitcoin", "data": {"eur": 41000, "eur_24h_vol": 5}})],
            Utc::now(),
        );

        assert_eq!(batch.rows()[0].current_price, dec!(41000));
        assert_eq!(batch.rows()[0].total_volume, dec!(5));
    }
}
