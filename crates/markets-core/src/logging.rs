//! tracing 구독자 초기화.
//!
//! 수집기 바이너리는 시작 시 [`init_logging`]을 한 번 호출합니다.
//! 레벨 하나만 주면 이 workspace의 crate에만 적용하고 의존성(sqlx, reqwest 등)은
//! `warn`으로 묶습니다. `RUST_LOG`가 있으면 그 필터를 그대로 씁니다.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// workspace crate 대상 이름.
const WORKSPACE_TARGETS: [&str; 3] = ["markets_core", "markets_data", "markets_collector"];

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// 여러 줄, 색상 (터미널)
    Pretty,
    /// 한 줄 JSON (로그 수집기)
    Json,
    /// 한 줄 텍스트 (스케줄러 로그)
    #[default]
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" | "text" => Ok(Self::Compact),
            other => Err(CoreError::InvalidInput(format!("알 수 없는 로그 형식: {}", other))),
        }
    }
}

/// 구독자 설정.
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    /// 레벨 (`info`) 또는 전체 필터 (`markets_data=debug,sqlx=warn`)
    pub level: String,
    pub format: LogFormat,
    /// ANSI 색상 사용 여부 (json 형식에서는 무시)
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new("info")
    }
}

impl LogConfig {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            format: LogFormat::default(),
            ansi: true,
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// `EnvFilter` 지시문.
    ///
    /// 레벨 하나(`debug`)는 workspace crate에만 적용되고 나머지는 `warn`.
    pub fn directive(&self) -> String {
        let level = self.level.trim();
        if level.contains('=') || level.contains(',') {
            return level.to_string();
        }
        let mut parts = vec!["warn".to_string()];
        parts.extend(WORKSPACE_TARGETS.iter().map(|t| format!("{}={}", t, level)));
        parts.join(",")
    }
}

/// 전역 구독자를 설치합니다. 두 번째 호출은 에러입니다.
///
/// ```no_run
/// use markets_core::logging::{init_logging, LogConfig, LogFormat};
///
/// init_logging(LogConfig::new("debug").with_format(LogFormat::Json)).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> CoreResult<()> {
    let directive = config.directive();
    let filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => EnvFilter::try_new(&directive)
            .map_err(|e| CoreError::Config(format!("로그 필터 '{}': {}", directive, e)))?,
    };

    let layer = fmt::layer().with_ansi(config.ansi);
    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Pretty => registry.with(layer.pretty()).try_init(),
        LogFormat::Json => registry.with(layer.json().flatten_event(true)).try_init(),
        LogFormat::Compact => registry.with(layer.compact()).try_init(),
    };
    installed.map_err(|e| CoreError::Config(format!("구독자 설치 실패: {}", e)))?;

    tracing::debug!(format = ?config.format, filter = %directive, "로깅 초기화");
    Ok(())
}

/// 자산군 레인 span. 두 번째 인자는 시도 번호.
#[macro_export]
macro_rules! lane_span {
    ($lane:expr) => {
        tracing::info_span!("lane", lane = %$lane)
    };
    ($lane:expr, $attempt:expr) => {
        tracing::info_span!("lane", lane = %$lane, attempt = $attempt)
    };
}
