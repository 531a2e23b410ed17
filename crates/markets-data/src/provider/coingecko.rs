//! CoinGecko 암호화폐 추출기.
//!
//! 기본 경로는 `coins/markets` 단일 배치 요청입니다. 응답은 코인 객체 배열이며,
//! 배열이 아니면 전체 실패로 처리합니다.
//! `simple/price` 경로는 코인 ID로 키가 잡힌 객체를 `{id, data}` 목록으로
//! 재구성해 반환합니다.

use super::{Extractor, FetchClient};
use async_trait::async_trait;
use markets_core::AssetClass;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

/// 기본 호가 통화.
pub const DEFAULT_VS_CURRENCY: &str = "usd";

/// `extract`가 사용할 CoinGecko 경로.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CryptoEndpoint {
    /// `coins/markets`
    #[default]
    Markets,
    /// `simple/price`
    SimplePrice,
}

/// CoinGecko 추출기.
pub struct CryptoExtractor {
    client: FetchClient,
    vs_currency: String,
    endpoint: CryptoEndpoint,
}

impl CryptoExtractor {
    pub fn new(client: FetchClient) -> Self {
        Self {
            client,
            vs_currency: DEFAULT_VS_CURRENCY.to_string(),
            endpoint: CryptoEndpoint::default(),
        }
    }

    /// `extract` 경로를 설정합니다.
    pub fn with_endpoint(mut self, endpoint: CryptoEndpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// 호가 통화를 설정합니다 (예: "usd", "eur").
    pub fn with_vs_currency(mut self, vs_currency: impl Into<String>) -> Self {
        self.vs_currency = vs_currency.into().to_lowercase();
        self
    }

    pub fn vs_currency(&self) -> &str {
        &self.vs_currency
    }

    /// `coins/markets` 상세 시세 조회.
    pub async fn extract_markets(&self, coin_ids: &[String]) -> Option<Vec<Value>> {
        if coin_ids.is_empty() {
            warn!("조회할 코인이 없습니다");
            return None;
        }
        info!(count = coin_ids.len(), "암호화폐 상세 시세 추출");

        let params = [
            ("ids", coin_ids.join(",")),
            ("vs_currency", self.vs_currency.clone()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", coin_ids.len().to_string()),
            ("page", "1".to_string()),
            ("sparkline", "false".to_string()),
            ("price_change_percentage", "24h".to_string()),
        ];

        match self.client.get(Some("coins/markets"), &params).await {
            Some(Value::Array(coins)) => {
                info!(count = coins.len(), "암호화폐 상세 시세 추출 성공");
                Some(coins)
            }
            Some(other) => {
                error!(kind = json_kind(&other), "coins/markets 응답이 배열이 아닙니다");
                None
            }
            None => {
                error!("암호화폐 상세 시세 추출 실패");
                None
            }
        }
    }

    /// `simple/price` 간이 시세 조회.
    ///
    /// 반환 항목은 `{ "id": <coin id>, "data": <quote> }` 형태입니다.
    pub async fn extract_simple_prices(&self, coin_ids: &[String]) -> Option<Vec<Value>> {
        if coin_ids.is_empty() {
            warn!("조회할 코인이 없습니다");
            return None;
        }
        info!(coins = %coin_ids.join(", "), "암호화폐 간이 시세 추출");

        let params = [
            ("ids", coin_ids.join(",")),
            ("vs_currencies", self.vs_currency.clone()),
            ("include_market_cap", "true".to_string()),
            ("include_24hr_vol", "true".to_string()),
            ("include_24hr_change", "true".to_string()),
        ];

        match self.client.get(Some("simple/price"), &params).await {
            Some(Value::Object(by_id)) if !by_id.is_empty() => {
                let coins: Vec<Value> = by_id
                    .into_iter()
                    .map(|(id, data)| json!({ "id": id, "data": data }))
                    .collect();
                info!(count = coins.len(), "암호화폐 간이 시세 추출 성공");
                Some(coins)
            }
            _ => {
                error!("암호화폐 간이 시세 추출 실패");
                None
            }
        }
    }
}

#[async_trait]
impl Extractor for CryptoExtractor {
    type Raw = Vec<Value>;

    fn asset(&self) -> AssetClass {
        AssetClass::Crypto
    }

    async fn extract(&self, identifiers: &[String]) -> Option<Self::Raw> {
        match self.endpoint {
            CryptoEndpoint::Markets => self.extract_markets(identifiers).await,
            CryptoEndpoint::SimplePrice => self.extract_simple_prices(identifiers).await,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
