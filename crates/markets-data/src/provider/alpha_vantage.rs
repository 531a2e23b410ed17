//! Alpha Vantage 주식 시세 추출기.
//!
//! `GLOBAL_QUOTE` 함수로 심볼당 한 번씩 요청합니다. 무료 키는 분당 호출 수가
//! 엄격하게 제한되므로 연속 호출 사이에 반드시 대기합니다 (기본 12초).
//! 대기는 취소 토큰으로 중단할 수 있으며, 중단 시 그때까지 성공한 결과를
//! 반환합니다.

use super::{Extractor, FetchClient};
use async_trait::async_trait;
use markets_core::AssetClass;
use serde_json::{Map, Value};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 기본 요청 간격 (분당 5회 제한).
pub const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_secs(12);

/// 시세 객체 키.
const GLOBAL_QUOTE_KEY: &str = "Global Quote";

/// 제한/에러 시 Alpha Vantage가 200과 함께 돌려주는 안내 키.
const NOTICE_KEYS: [&str; 3] = ["Note", "Information", "Error Message"];

/// 한 심볼의 원시 시세.
#[derive(Debug, Clone, PartialEq)]
pub struct RawQuote {
    /// 요청한 심볼
    pub symbol: String,
    /// `"Global Quote"` 객체 (`"05. price"` 등 번호가 붙은 키)
    pub quote: Map<String, Value>,
}

/// Alpha Vantage 주식 추출기.
pub struct StocksExtractor {
    client: FetchClient,
    api_key: String,
    request_interval: Duration,
    cancel: CancellationToken,
}

impl StocksExtractor {
    pub fn new(client: FetchClient, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            request_interval: DEFAULT_REQUEST_INTERVAL,
            cancel: CancellationToken::new(),
        }
    }

    /// 연속 호출 사이 대기 시간을 설정합니다.
    pub fn with_request_interval(mut self, interval: Duration) -> Self {
        self.request_interval = interval;
        self
    }

    /// 대기를 중단시킬 취소 토큰을 설정합니다.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn request_interval(&self) -> Duration {
        self.request_interval
    }

    /// 단일 심볼 시세 조회.
    ///
    /// 응답에 시세 객체가 없거나 비어 있으면 `None`을 반환합니다.
    pub async fn extract_quote(&self, symbol: &str) -> Option<RawQuote> {
        info!(symbol = symbol, "주식 시세 추출");

        let params = [
            ("function", "GLOBAL_QUOTE".to_string()),
            ("symbol", symbol.to_string()),
            ("apikey", self.api_key.clone()),
        ];
        let body = self.client.get(None, &params).await?;

        match body.get(GLOBAL_QUOTE_KEY) {
            Some(Value::Object(quote)) if !quote.is_empty() => {
                info!(symbol = symbol, "주식 시세 추출 성공");
                Some(RawQuote {
                    symbol: symbol.to_string(),
                    quote: quote.clone(),
                })
            }
            Some(Value::Object(_)) => {
                warn!(symbol = symbol, "빈 시세 응답");
                None
            }
            _ => {
                let notice = NOTICE_KEYS
                    .iter()
                    .find_map(|k| body.get(*k).and_then(Value::as_str));
                error!(symbol = symbol, notice = ?notice, "시세 추출 실패");
                None
            }
        }
    }

    /// 여러 심볼을 순차 조회합니다.
    ///
    /// 연속 호출 사이에 `request_interval`만큼 대기하며, 마지막 호출 뒤에는
    /// 대기하지 않습니다. 취소되면 남은 심볼을 건너뜁니다.
    pub async fn extract_quotes(&self, symbols: &[String]) -> Vec<RawQuote> {
        let mut quotes = Vec::with_capacity(symbols.len());

        for (idx, symbol) in symbols.iter().enumerate() {
            if self.cancel.is_cancelled() {
                warn!(remaining = symbols.len() - idx, "취소 요청으로 추출 중단");
                break;
            }

            if let Some(quote) = self.extract_quote(symbol).await {
                quotes.push(quote);
            }

            if idx + 1 < symbols.len() && !self.pause().await {
                warn!(remaining = symbols.len() - idx - 1, "대기 중 취소되어 추출 중단");
                break;
            }
        }

        let missing = symbols.len() - quotes.len();
        if missing > 0 {
            warn!(
                extracted = quotes.len(),
                requested = symbols.len(),
                missing,
                "일부 심볼 추출 실패"
            );
        }
        info!(
            extracted = quotes.len(),
            requested = symbols.len(),
            "주식 추출 완료"
        );
        quotes
    }

    /// 요청 간격만큼 대기합니다. 취소되면 `false`.
    async fn pause(&self) -> bool {
        info!(
            delay_secs = self.request_interval.as_secs_f64(),
            "다음 요청까지 대기 (rate limit)"
        );
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(self.request_interval) => true,
        }
    }
}

#[async_trait]
impl Extractor for StocksExtractor {
    type Raw = Vec<RawQuote>;

    fn asset(&self) -> AssetClass {
        AssetClass::Stocks
    }

    async fn extract(&self, identifiers: &[String]) -> Option<Self::Raw> {
        let quotes = self.extract_quotes(identifiers).await;
        if quotes.is_empty() {
            None
        } else {
            Some(quotes)
        }
    }
}
