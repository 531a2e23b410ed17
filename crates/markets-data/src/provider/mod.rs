//! 시장 데이터 제공자 (추출기).
//!
//! 자산군별로 외부 API 하나씩을 감쌉니다:
//! - 주식: Alpha Vantage (`GLOBAL_QUOTE`)
//! - 암호화폐: CoinGecko (`coins/markets`, `simple/price`)
//! - 환율: ExchangeRate-API (`/latest/{base}`)

pub mod alpha_vantage;
pub mod client;
pub mod coingecko;
pub mod exchange_rate;

use async_trait::async_trait;
use markets_core::AssetClass;

pub use alpha_vantage::{RawQuote, StocksExtractor};
pub use client::FetchClient;
pub use coingecko::{CryptoEndpoint, CryptoExtractor};
pub use exchange_rate::{ForexExtractor, RawRates};

/// 자산군별 추출기 trait.
///
/// 실패는 `None`으로 표현합니다. 부분 실패는 구현체가 건너뛰고
/// 성공한 항목만 반환합니다.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// 제공자 원시 응답 타입.
    type Raw: Send + Sync;

    /// 이 추출기가 담당하는 자산군.
    fn asset(&self) -> AssetClass;

    /// 식별자 목록(티커, 코인 ID, 대상 통화)에 대한 원시 데이터 추출.
    async fn extract(&self, identifiers: &[String]) -> Option<Self::Raw>;
}
