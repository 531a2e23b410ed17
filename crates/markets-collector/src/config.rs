//! 파이프라인 설정 모듈.
//!
//! 우선순위: 기본값 → TOML 파일 (`config/pipeline.toml` 또는 `--config`)
//! → 환경변수 (`MARKETS__STOCKS__SYMBOLS=AAPL,MSFT` 형식).
//! Alpha Vantage API 키는 `ALPHA_VANTAGE_API_KEY`에서 읽습니다.

use crate::{CollectorError, Result};
use markets_core::{LogConfig, LogFormat};
use markets_data::provider::{
    alpha_vantage, coingecko::DEFAULT_VS_CURRENCY, exchange_rate::DEFAULT_BASE_CURRENCY,
};
use markets_data::{CryptoEndpoint, DatabaseConfig};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 기본 설정 파일 경로 (확장자 제외).
pub const DEFAULT_CONFIG_PATH: &str = "config/pipeline";

/// API 키 환경변수.
pub const API_KEY_ENV: &str = "ALPHA_VANTAGE_API_KEY";

/// 파이프라인 전체 설정
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// HTTP 클라이언트 설정
    pub http: HttpConfig,
    /// 주식 레인 설정
    pub stocks: StocksConfig,
    /// 암호화폐 레인 설정
    pub crypto: CryptoConfig,
    /// 환율 레인 설정
    pub forex: ForexConfig,
    /// 스케줄/재시도 설정
    pub schedule: ScheduleConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// HTTP 클라이언트 설정
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 주식 레인 설정
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StocksConfig {
    /// 레인 활성화
    pub enabled: bool,
    /// Alpha Vantage 엔드포인트
    pub base_url: String,
    /// API 키 (`ALPHA_VANTAGE_API_KEY`가 우선)
    pub api_key: Option<String>,
    /// 조회할 티커
    pub symbols: Vec<String>,
    /// 연속 요청 간격 (초)
    pub request_interval_secs: u64,
}

impl Default for StocksConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://www.alphavantage.co/query".to_string(),
            api_key: None,
            symbols: vec!["AAPL".into(), "MSFT".into(), "GOOGL".into()],
            request_interval_secs: alpha_vantage::DEFAULT_REQUEST_INTERVAL.as_secs(),
        }
    }
}

impl StocksConfig {
    pub fn request_interval(&self) -> Duration {
        Duration::from_secs(self.request_interval_secs)
    }
}

/// 암호화폐 레인 설정
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    pub enabled: bool,
    /// CoinGecko API 루트
    pub base_url: String,
    /// CoinGecko 코인 ID
    pub coin_ids: Vec<String>,
    /// 호가 통화
    pub vs_currency: String,
    /// 사용할 엔드포인트 (`markets` | `simple_price`)
    pub endpoint: CryptoEndpoint,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.coingecko.com/api/v3".to_string(),
            coin_ids: vec!["bitcoin".into(), "ethereum".into()],
            vs_currency: DEFAULT_VS_CURRENCY.to_string(),
            endpoint: CryptoEndpoint::Markets,
        }
    }
}

/// 환율 레인 설정
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForexConfig {
    pub enabled: bool,
    /// ExchangeRate-API 루트 (`{base_url}/{BASE}`)
    pub base_url: String,
    /// 기준 통화
    pub base_currency: String,
    /// 대상 통화
    pub targets: Vec<String>,
}

impl Default for ForexConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.exchangerate-api.com/v4/latest".to_string(),
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
            targets: vec!["EUR".into(), "GBP".into(), "JPY".into()],
        }
    }
}

/// 스케줄/재시도 설정
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// 데몬 실행 주기 (분)
    pub interval_minutes: u64,
    /// 실패한 레인의 재시도 횟수
    pub max_retries: u32,
    /// 재시도 전 대기 (초)
    pub retry_delay_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 60,
            max_retries: 1,
            retry_delay_secs: 300,
        }
    }
}

impl ScheduleConfig {
    /// 데몬 실행 주기를 Duration으로 반환
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// 로깅 설정
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨 필터
    pub level: String,
    /// 출력 형식
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl LoggingConfig {
    /// CLI 레벨이 있으면 설정 레벨을 덮어씁니다.
    pub fn to_log_config(&self, level_override: Option<&str>) -> LogConfig {
        LogConfig::new(level_override.unwrap_or(&self.level)).with_format(self.format)
    }
}

impl PipelineConfig {
    /// 파일과 환경변수에서 설정을 로드합니다.
    ///
    /// `path`가 주어지면 파일이 반드시 있어야 하고, 없으면
    /// `config/pipeline.toml`을 선택적으로 읽습니다.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_PATH).required(false),
        };

        let builder = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("MARKETS")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("stocks.symbols")
                    .with_list_parse_key("crypto.coin_ids")
                    .with_list_parse_key("forex.targets"),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;
        config.stocks.api_key = Some(resolve_api_key(
            config.stocks.api_key.take(),
            std::env::var(API_KEY_ENV).ok(),
        ));
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 로드합니다 (환경변수 미적용).
    pub fn from_toml(text: &str) -> Result<Self> {
        let mut config: Self = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.stocks.api_key = Some(resolve_api_key(config.stocks.api_key.take(), None));
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.schedule.interval_minutes == 0 {
            return Err(CollectorError::Config(
                "schedule.interval_minutes는 1 이상이어야 합니다".to_string(),
            ));
        }
        Ok(())
    }

    /// 확정된 Alpha Vantage API 키.
    pub fn api_key(&self) -> &str {
        self.stocks.api_key.as_deref().unwrap_or("demo")
    }
}

/// 환경변수 → 설정 파일 → `"demo"` 순으로 API 키를 고릅니다.
fn resolve_api_key(configured: Option<String>, from_env: Option<String>) -> String {
    from_env
        .into_iter()
        .chain(configured)
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
        .unwrap_or_else(|| "demo".to_string())
}
