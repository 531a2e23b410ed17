//! 레코드 타입별 테이블 매핑.
//!
//! 가격류 필드는 `REAL` 컬럼에 저장하고, 읽을 때 다시 `Decimal`로 복원합니다.

use crate::error::Result;
use chrono::{DateTime, Utc};
use markets_core::{CanonicalRecord, CryptoRecord, ForexRecord, StockRecord};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::Row;
use std::str::FromStr;

/// 삽입 쿼리 타입.
pub type InsertQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// 테이블 하나에 저장되는 레코드.
pub trait TableRecord: CanonicalRecord + Sized {
    /// 테이블 이름.
    const TABLE: &'static str;
    /// `id`를 제외한 컬럼 (삽입/조회 순서).
    const COLUMNS: &'static [&'static str];
    /// `CREATE TABLE` 컬럼 정의 (`id` 제외).
    const SCHEMA: &'static str;

    /// `COLUMNS` 순서대로 값을 바인딩합니다.
    fn bind_insert<'q>(&'q self, query: InsertQuery<'q>) -> InsertQuery<'q>;

    /// 조회 행 → 레코드.
    fn from_row(row: &SqliteRow) -> Result<Self>;

    /// `CREATE TABLE IF NOT EXISTS` 문.
    fn create_sql() -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (id INTEGER PRIMARY KEY AUTOINCREMENT, {})",
            Self::TABLE,
            Self::SCHEMA
        )
    }

    /// 파라미터 바인딩 `INSERT` 문.
    fn insert_sql() -> String {
        let placeholders = vec!["?"; Self::COLUMNS.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            Self::TABLE,
            Self::COLUMNS.join(", "),
            placeholders
        )
    }

    /// 삽입 순서대로 전체 행을 읽는 `SELECT` 문.
    fn select_sql() -> String {
        format!(
            "SELECT {} FROM {} ORDER BY id",
            Self::COLUMNS.join(", "),
            Self::TABLE
        )
    }
}

fn real(value: &Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

/// REAL → Decimal. 최단 십진 표기를 거쳐 이진 오차가 붙지 않게 합니다.
fn decimal(row: &SqliteRow, column: &str) -> Result<Decimal> {
    let value: f64 = row.try_get(column)?;
    Ok(Decimal::from_str(&value.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(value))
        .unwrap_or_default())
}

fn timestamp(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
    Ok(row.try_get(column)?)
}

impl TableRecord for StockRecord {
    const TABLE: &'static str = "stocks";
    const COLUMNS: &'static [&'static str] = &[
        "symbol",
        "price",
        "open",
        "high",
        "low",
        "volume",
        "latest_trading_day",
        "previous_close",
        "change",
        "change_percent",
        "timestamp",
        "extracted_at",
    ];
    const SCHEMA: &'static str = "symbol TEXT NOT NULL, \
        price REAL NOT NULL, \
        open REAL, \
        high REAL, \
        low REAL, \
        volume INTEGER, \
        latest_trading_day TEXT, \
        previous_close REAL, \
        change REAL, \
        change_percent REAL, \
        timestamp TEXT NOT NULL, \
        extracted_at TEXT NOT NULL";

    fn bind_insert<'q>(&'q self, query: InsertQuery<'q>) -> InsertQuery<'q> {
        query
            .bind(self.symbol.as_str())
            .bind(real(&self.price))
            .bind(real(&self.open))
            .bind(real(&self.high))
            .bind(real(&self.low))
            .bind(self.volume)
            .bind(self.latest_trading_day.as_deref())
            .bind(real(&self.previous_close))
            .bind(real(&self.change))
            .bind(real(&self.change_percent))
            .bind(self.timestamp)
            .bind(self.extracted_at)
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            symbol: row.try_get("symbol")?,
            price: decimal(row, "price")?,
            open: decimal(row, "open")?,
            high: decimal(row, "high")?,
            low: decimal(row, "low")?,
            volume: row.try_get("volume")?,
            latest_trading_day: row.try_get("latest_trading_day")?,
            previous_close: decimal(row, "previous_close")?,
            change: decimal(row, "change")?,
            change_percent: decimal(row, "change_percent")?,
            timestamp: timestamp(row, "timestamp")?,
            extracted_at: timestamp(row, "extracted_at")?,
        })
    }
}

impl TableRecord for CryptoRecord {
    const TABLE: &'static str = "crypto";
    const COLUMNS: &'static [&'static str] = &[
        "symbol",
        "name",
        "current_price",
        "market_cap",
        "total_volume",
        "price_change_24h",
        "timestamp",
        "extracted_at",
    ];
    const SCHEMA: &'static str = "symbol TEXT NOT NULL, \
        name TEXT, \
        current_price REAL NOT NULL, \
        market_cap REAL, \
        total_volume REAL, \
        price_change_24h REAL, \
        timestamp TEXT NOT NULL, \
        extracted_at TEXT NOT NULL";

    fn bind_insert<'q>(&'q self, query: InsertQuery<'q>) -> InsertQuery<'q> {
        query
            .bind(self.symbol.as_str())
            .bind(self.name.as_str())
            .bind(real(&self.current_price))
            .bind(real(&self.market_cap))
            .bind(real(&self.total_volume))
            .bind(real(&self.price_change_24h))
            .bind(self.timestamp)
            .bind(self.extracted_at)
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            symbol: row.try_get("symbol")?,
            name: row.try_get("name")?,
            current_price: decimal(row, "current_price")?,
            market_cap: decimal(row, "market_cap")?,
            total_volume: decimal(row, "total_volume")?,
            price_change_24h: decimal(row, "price_change_24h")?,
            timestamp: timestamp(row, "timestamp")?,
            extracted_at: timestamp(row, "extracted_at")?,
        })
    }
}

impl TableRecord for ForexRecord {
    const TABLE: &'static str = "forex";
    const COLUMNS: &'static [&'static str] = &[
        "base_currency",
        "target_currency",
        "exchange_rate",
        "rate_date",
        "timestamp",
        "extracted_at",
    ];
    const SCHEMA: &'static str = "base_currency TEXT NOT NULL, \
        target_currency TEXT NOT NULL, \
        exchange_rate REAL NOT NULL, \
        rate_date TEXT, \
        timestamp TEXT NOT NULL, \
        extracted_at TEXT NOT NULL";

    fn bind_insert<'q>(&'q self, query: InsertQuery<'q>) -> InsertQuery<'q> {
        query
            .bind(self.base_currency.as_str())
            .bind(self.target_currency.as_str())
            .bind(real(&self.exchange_rate))
            .bind(self.rate_date.as_deref())
            .bind(self.timestamp)
            .bind(self.extracted_at)
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            base_currency: row.try_get("base_currency")?,
            target_currency: row.try_get("target_currency")?,
            exchange_rate: decimal(row, "exchange_rate")?,
            rate_date: row.try_get("rate_date")?,
            timestamp: timestamp(row, "timestamp")?,
            extracted_at: timestamp(row, "extracted_at")?,
        })
    }
}
