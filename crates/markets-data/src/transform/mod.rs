//! 원시 제공자 응답 → 정규화 레코드 변환.
//!
//! 변환기는 I/O가 없는 순수 함수입니다. 레코드 단위 오류(타입 변환 실패,
//! 필수 키 누락, 형태 불일치)는 해당 레코드만 건너뛰고 로그를 남기며,
//! 매핑 후 품질 검사 단계에서 필수 필드가 빠진 행을 제거합니다.

pub mod crypto;
pub mod forex;
pub mod stocks;

use crate::error::{DataError, Result};
use chrono::{DateTime, Utc};
use markets_core::{CanonicalRecord, RecordBatch};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

pub use crypto::{CoinPayload, CryptoTransformer};
pub use forex::ForexTransformer;
pub use stocks::StocksTransformer;

/// 자산군별 변환기 trait.
pub trait Transformer: Send + Sync {
    /// 입력 원시 타입 (추출기의 `Raw`와 동일).
    type Raw: Send + Sync;
    /// 출력 레코드 타입.
    type Record: CanonicalRecord;

    /// 원시 데이터를 정규화 배치로 변환합니다.
    ///
    /// `extracted_at`은 배치 전체에 동일하게 기록됩니다.
    fn transform(&self, raw: &Self::Raw, extracted_at: DateTime<Utc>) -> RecordBatch<Self::Record>;
}

/// 첫 번째로 존재하는 (null이 아닌) 키의 값.
pub(crate) fn first_present<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

/// 문자열을 Decimal로 파싱 (지수 표기 포함).
pub(crate) fn decimal_from_str(s: &str) -> Option<Decimal> {
    let s = s.trim();
    Decimal::from_str(s)
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

/// JSON 값을 Decimal로 변환합니다.
///
/// null/빈 문자열은 `None`(값 없음), 숫자가 아닌 값은 에러입니다.
pub(crate) fn to_decimal(value: Option<&Value>, field: &str) -> Result<Option<Decimal>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                return Ok(Some(Decimal::from(i)));
            }
            decimal_from_str(&n.to_string())
                .map(Some)
                .ok_or_else(|| DataError::ParseError(format!("{}: {}", field, n)))
        }
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => decimal_from_str(s)
            .map(Some)
            .ok_or_else(|| DataError::ParseError(format!("{}: '{}'", field, s))),
        Some(other) => Err(DataError::ParseError(format!(
            "{}: 숫자가 아닌 값 {}",
            field, other
        ))),
    }
}

/// JSON 값을 0 이상의 정수로 변환합니다.
pub(crate) fn to_volume(value: Option<&Value>, field: &str) -> Result<Option<i64>> {
    let Some(amount) = to_decimal(value, field)? else {
        return Ok(None);
    };
    if amount.is_sign_negative() || !amount.fract().is_zero() {
        return Err(DataError::ParseError(format!(
            "{}: 0 이상의 정수가 아님 {}",
            field, amount
        )));
    }
    amount
        .to_i64()
        .map(Some)
        .ok_or_else(|| DataError::ParseError(format!("{}: 범위 초과 {}", field, amount)))
}

/// RFC 3339 문자열을 UTC 시각으로 파싱합니다.
pub(crate) fn parse_rfc3339(value: Option<&Value>) -> Option<DateTime<Utc>> {
    value
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
