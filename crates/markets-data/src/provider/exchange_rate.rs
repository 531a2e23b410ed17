//! ExchangeRate-API 환율 추출기.
//!
//! 기준 통화를 경로 세그먼트로 붙여 전체 환율표를 한 번에 받습니다
//! (`{base_url}/{BASE}`). 요청한 대상 통화만 요청 순서대로 남기고,
//! 응답에 없는 통화는 에러 없이 제외합니다.

use super::{Extractor, FetchClient};
use async_trait::async_trait;
use markets_core::AssetClass;
use serde_json::Value;
use tracing::{error, info, warn};

/// 기본 기준 통화.
pub const DEFAULT_BASE_CURRENCY: &str = "USD";

/// 기준 통화 하나에 대한 원시 환율표.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRates {
    /// 기준 통화
    pub base: String,
    /// 제공자 기준일 (`date`)
    pub date: Option<String>,
    /// 제공자 갱신 시각 (unix 초, `time_last_updated`)
    pub time_last_updated: Option<i64>,
    /// (대상 통화, 원시 환율 값) 목록
    pub rates: Vec<(String, Value)>,
}

impl RawRates {
    /// 대상 통화의 원시 환율 값.
    pub fn rate(&self, currency: &str) -> Option<&Value> {
        self.rates
            .iter()
            .find(|(code, _)| code == currency)
            .map(|(_, rate)| rate)
    }
}

/// ExchangeRate-API 추출기.
pub struct ForexExtractor {
    client: FetchClient,
    base_currency: String,
}

impl ForexExtractor {
    pub fn new(client: FetchClient, base_currency: impl Into<String>) -> Self {
        Self {
            client,
            base_currency: base_currency.into().trim().to_uppercase(),
        }
    }

    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    /// 요청한 대상 통화의 환율만 추출합니다.
    pub async fn extract_rates(&self, targets: &[String]) -> Option<RawRates> {
        info!(
            base = %self.base_currency,
            targets = %targets.join(", "),
            "환율 추출"
        );

        let mut table = self.fetch_table().await?;
        let requested = targets.len();
        let mut all = std::mem::take(&mut table.rates);

        table.rates = targets
            .iter()
            .map(|t| t.trim().to_uppercase())
            .filter_map(|code| {
                let idx = all.iter().position(|(c, _)| *c == code)?;
                Some(all.swap_remove(idx))
            })
            .collect();

        if table.rates.len() < requested {
            warn!(
                requested,
                found = table.rates.len(),
                "일부 대상 통화가 응답에 없습니다"
            );
        }
        info!(count = table.rates.len(), "환율 추출 성공");
        Some(table)
    }

    /// 기준 통화의 전체 환율표를 추출합니다.
    pub async fn extract_all_rates(&self) -> Option<RawRates> {
        info!(base = %self.base_currency, "전체 환율 추출");
        let table = self.fetch_table().await?;
        info!(count = table.rates.len(), "전체 환율 추출 성공");
        Some(table)
    }

    async fn fetch_table(&self) -> Option<RawRates> {
        let Some(body) = self.client.get(Some(&self.base_currency), &[]).await else {
            error!(base = %self.base_currency, "환율 추출 실패");
            return None;
        };

        let Some(rates) = body.get("rates").and_then(Value::as_object) else {
            error!(base = %self.base_currency, "응답에 rates 객체가 없습니다");
            return None;
        };

        Some(RawRates {
            base: self.base_currency.clone(),
            date: body.get("date").and_then(Value::as_str).map(str::to_string),
            time_last_updated: body.get("time_last_updated").and_then(Value::as_i64),
            rates: rates
                .iter()
                .map(|(code, rate)| (code.clone(), rate.clone()))
                .collect(),
        })
    }
}

#[async_trait]
impl Extractor for ForexExtractor {
    type Raw = RawRates;

    fn asset(&self) -> AssetClass {
        AssetClass::Forex
    }

    async fn extract(&self, identifiers: &[String]) -> Option<Self::Raw> {
        self.extract_rates(identifiers).await
    }
}
