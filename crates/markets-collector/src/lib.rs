//! Scheduled market data collector.
//!
//! 이 crate는 세 자산군 레인을 실행하는 바이너리와 라이브러리를 제공합니다:
//! - 주식 (Alpha Vantage)
//! - 암호화폐 (CoinGecko)
//! - 환율 (ExchangeRate-API)
//!
//! 각 레인은 추출 → 변환 → 적재를 순서대로 수행하며, 레인끼리는 독립적으로
//! 동시에 실행됩니다.

pub mod config;
pub mod error;
pub mod export;
pub mod lane;
pub mod pipeline;
pub mod retry;
pub mod stats;

pub use config::PipelineConfig;
pub use error::{CollectorError, Result};
pub use lane::{Lane, RawItems};
pub use pipeline::Pipeline;
pub use retry::RetryPolicy;
pub use stats::{LaneReport, LaneState, RunSummary};
