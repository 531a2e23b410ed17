//! 정규화된 시장 데이터 레코드.
//!
//! 세 개의 자산군 레인이 각각 생성하는 평탄한(flat) 레코드를 정의합니다:
//! - `StockRecord` - 주식 시세 스냅샷
//! - `CryptoRecord` - 암호화폐 시세 스냅샷
//! - `ForexRecord` - 환율 스냅샷
//!
//! 레코드는 실행마다 새로 생성되며 생성 후 변경되지 않습니다.

use crate::error::CoreError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 자산군. 각 자산군은 독립된 레인과 저장 테이블을 가집니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Stocks,
    Crypto,
    Forex,
}

impl AssetClass {
    /// 전체 자산군 (레인 실행 순서).
    pub const ALL: [AssetClass; 3] = [AssetClass::Stocks, AssetClass::Crypto, AssetClass::Forex];

    /// 저장 테이블 이름.
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Stocks => "stocks",
            Self::Crypto => "crypto",
            Self::Forex => "forex",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

impl std::str::FromStr for AssetClass {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stocks" | "stock" => Ok(Self::Stocks),
            "crypto" | "cryptocurrency" => Ok(Self::Crypto),
            "forex" | "fx" => Ok(Self::Forex),
            _ => Err(CoreError::InvalidInput(format!("Unknown asset class: {}", s))),
        }
    }
}

/// 자산군에 속한 정규화 레코드.
pub trait CanonicalRecord: Clone + Send + Sync + 'static {
    /// 레코드가 속한 자산군.
    const ASSET: AssetClass;
}

/// 주식 시세 레코드.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    /// 티커 (예: AAPL)
    pub symbol: String,
    /// 현재가
    pub price: Decimal,
    /// 시가
    pub open: Decimal,
    /// 고가
    pub high: Decimal,
    /// 저가
    pub low: Decimal,
    /// 거래량 (0 이상)
    pub volume: i64,
    /// 최근 거래일 (제공자 문자열 그대로)
    pub latest_trading_day: Option<String>,
    /// 전일 종가
    pub previous_close: Decimal,
    /// 전일 대비
    pub change: Decimal,
    /// 등락률 (%)
    pub change_percent: Decimal,
    /// 관측 시각
    pub timestamp: DateTime<Utc>,
    /// 추출 시각
    pub extracted_at: DateTime<Utc>,
}

impl CanonicalRecord for StockRecord {
    const ASSET: AssetClass = AssetClass::Stocks;
}

/// 암호화폐 시세 레코드.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoRecord {
    /// 심볼 (대문자, 예: BTC)
    pub symbol: String,
    /// 코인 이름
    pub name: String,
    /// 현재가
    pub current_price: Decimal,
    /// 시가총액 (없으면 0)
    pub market_cap: Decimal,
    /// 24시간 거래량 (없으면 0)
    pub total_volume: Decimal,
    /// 24시간 등락률 (%, 없으면 0)
    pub price_change_24h: Decimal,
    /// 관측 시각
    pub timestamp: DateTime<Utc>,
    /// 추출 시각
    pub extracted_at: DateTime<Utc>,
}

impl CanonicalRecord for CryptoRecord {
    const ASSET: AssetClass = AssetClass::Crypto;
}

/// 환율 레코드.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForexRecord {
    /// 기준 통화 (3자리 코드)
    pub base_currency: String,
    /// 대상 통화 (3자리 코드)
    pub target_currency: String,
    /// 환율 (양수)
    pub exchange_rate: Decimal,
    /// 제공자가 보고한 환율 기준일
    pub rate_date: Option<String>,
    /// 관측 시각
    pub timestamp: DateTime<Utc>,
    /// 추출 시각
    pub extracted_at: DateTime<Utc>,
}

impl CanonicalRecord for ForexRecord {
    const ASSET: AssetClass = AssetClass::Forex;
}

/// 통화 코드가 3자리 알파벳인지 확인합니다.
pub fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

/// 변환 결과 테이블 (삽입 순서 유지).
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBatch<R> {
    rows: Vec<R>,
}

impl<R> Default for RecordBatch<R> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<R> RecordBatch<R> {
    /// 빈 배치를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: R) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }

    /// 조건을 만족하는 행만 남기고, 제거된 행 수를 반환합니다.
    pub fn retain<F: FnMut(&R) -> bool>(&mut self, keep: F) -> usize {
        let before = self.rows.len();
        self.rows.retain(keep);
        before - self.rows.len()
    }

    pub fn into_rows(self) -> Vec<R> {
        self.rows
    }
}

impl<R> From<Vec<R>> for RecordBatch<R> {
    fn from(rows: Vec<R>) -> Self {
        Self { rows }
    }
}

impl<R> FromIterator<R> for RecordBatch<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl<R> IntoIterator for RecordBatch<R> {
    type Item = R;
    type IntoIter = std::vec::IntoIter<R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a, R> IntoIterator for &'a RecordBatch<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
