//! 시장 데이터 추출, 변환, 저장.
//!
//! 이 crate는 다음을 제공합니다:
//! - 제공자별 추출기 (Alpha Vantage, CoinGecko, ExchangeRate-API)
//! - 원시 응답 → 정규화 레코드 변환기
//! - SQLite 레코드 저장소

pub mod error;
pub mod provider;
pub mod storage;
pub mod transform;

pub use error::{DataError, Result};

pub use provider::{
    CryptoEndpoint, CryptoExtractor, Extractor, FetchClient, ForexExtractor, RawQuote, RawRates,
    StocksExtractor,
};
pub use storage::{DatabaseConfig, RecordStore, TableRecord};
pub use transform::{
    CoinPayload, CryptoTransformer, ForexTransformer, StocksTransformer, Transformer,
};
