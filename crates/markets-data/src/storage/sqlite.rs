//! SQLite 레코드 저장소.
//!
//! 자산군마다 하나의 append-only 테이블(`stocks`, `crypto`, `forex`)을 사용합니다.
//! 배치 하나는 하나의 트랜잭션으로 적재되며, 실패는 호출자에게 그대로 전달됩니다.

use super::table::TableRecord;
use crate::error::{DataError, Result};
use markets_core::{AssetClass, CryptoRecord, ForexRecord, RecordBatch, StockRecord};
use serde::Deserialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 데이터베이스 URL (sqlite://path/to/file.db)
    #[serde(default = "default_url")]
    pub url: String,
    /// 풀의 최대 연결 수
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// 연결 타임아웃 (초)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_url() -> String {
    "sqlite://data/markets.db".to_string()
}
fn default_max_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    30
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// 레코드 저장소 (SQLite 연결 풀 래퍼).
#[derive(Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    /// 연결 풀을 생성합니다. 데이터베이스 파일이 없으면 만듭니다.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!(url = %config.url, "Connecting to database...");

        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| DataError::ConfigError(format!("{}: {}", config.url, e)))?
            .create_if_missing(true);

        if let Some(dir) = options.get_filename().parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(dir).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect_with(options)
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        info!("Database connection established");
        Ok(Self { pool })
    }

    /// 기존 연결 풀에서 저장소를 생성합니다.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 내부 연결 풀을 반환합니다.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// 세 테이블을 생성합니다. 이미 있으면 아무것도 하지 않습니다.
    pub async fn create_tables(&self) -> Result<()> {
        for sql in [
            StockRecord::create_sql(),
            CryptoRecord::create_sql(),
            ForexRecord::create_sql(),
        ] {
            sqlx::query(&sql)
                .execute(&self.pool)
                .await
                .map_err(|e| DataError::QueryError(e.to_string()))?;
        }
        info!("Database tables ready");
        Ok(())
    }

    /// 배치를 레코드 타입의 테이블에 추가합니다.
    ///
    /// 빈 배치는 데이터베이스에 접근하지 않고 0을 반환합니다.
    #[instrument(skip(self, batch), fields(table = R::TABLE, count = batch.len()))]
    pub async fn load<R: TableRecord>(&self, batch: &RecordBatch<R>) -> Result<u64> {
        if batch.is_empty() {
            debug!("빈 배치, 적재 생략");
            return Ok(0);
        }

        let sql = R::insert_sql();
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for row in batch {
            let result = row
                .bind_insert(sqlx::query(&sql))
                .execute(&mut *tx)
                .await
                .map_err(|e| DataError::InsertError(format!("{}: {}", R::TABLE, e)))?;
            inserted += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| DataError::InsertError(format!("{}: {}", R::TABLE, e)))?;

        info!(table = R::TABLE, count = inserted, "적재 완료");
        Ok(inserted)
    }

    /// 자산군 테이블의 행 수.
    pub async fn count(&self, asset: AssetClass) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", asset.table_name());
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// 전체 자산군 테이블의 행 수.
    pub async fn record_counts(&self) -> Result<Vec<(AssetClass, i64)>> {
        let mut counts = Vec::with_capacity(AssetClass::ALL.len());
        for asset in AssetClass::ALL {
            counts.push((asset, self.count(asset).await?));
        }
        Ok(counts)
    }

    /// 테이블 전체 행을 삽입 순서대로 읽습니다.
    pub async fn fetch_rows<R: TableRecord>(&self) -> Result<Vec<R>> {
        let sql = R::select_sql();
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(R::from_row).collect()
    }
}

async fn ensure_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| DataError::ConnectionError(format!("{}: {}", dir.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    /// 테이블이 없는 저장소. 쓰기를 시도하면 실패합니다.
    async fn bare_store() -> RecordStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        RecordStore::from_pool(pool)
    }

    async fn memory_store() -> RecordStore {
        let store = bare_store().await;
        store.create_tables().await.unwrap();
        store
    }

    fn stock(symbol: &str) -> StockRecord {
        let now = Utc::now();
        StockRecord {
            symbol: symbol.to_string(),
            price: dec!(150.00),
            open: dec!(148.50),
            high: dec!(151.00),
            low: dec!(148.00),
            volume: 1_000_000,
            latest_trading_day: Some("2024-01-02".to_string()),
            previous_close: dec!(148.50),
            change: dec!(1.5),
            change_percent: dec!(1.0),
            timestamp: now,
            extracted_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() {
        let store = memory_store().await;
        store.create_tables().await.unwrap();

        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' \
             AND name IN ('stocks', 'crypto', 'forex')",
        )
        .fetch_one(store.pool())
        .await
        .unwrap();
        assert_eq!(tables, 3);
    }

    #[tokio::test]
    async fn test_empty_batch_loads_nothing() {
        let store = bare_store().await;

        let loaded = store.load(&RecordBatch::<StockRecord>::new()).await.unwrap();

        assert_eq!(loaded, 0);
        // 테이블이 여전히 없어야 한다
        assert!(store.count(AssetClass::Stocks).await.is_err());
    }

    #[tokio::test]
    async fn test_load_appends_rows() {
        let store = memory_store().await;
        let batch: RecordBatch<StockRecord> = vec![stock("AAPL")].into();

        assert_eq!(store.load(&batch).await.unwrap(), 1);
        assert_eq!(store.load(&batch).await.unwrap(), 1);

        assert_eq!(store.count(AssetClass::Stocks).await.unwrap(), 2);
        assert_eq!(store.count(AssetClass::Crypto).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_fetch_rows_restores_values() {
        let store = memory_store().await;
        let original = stock("AAPL");
        store.load(&RecordBatch::from(vec![original.clone()])).await.unwrap();

        let rows: Vec<StockRecord> = store.fetch_rows().await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].symbol, "AAPL");
        assert_eq!(rows[0].price, dec!(150.00));
        assert_eq!(rows[0].change_percent, dec!(1.0));
        assert_eq!(rows[0].volume, 1_000_000);
        assert_eq!(rows[0].latest_trading_day.as_deref(), Some("2024-01-02"));
        assert_eq!(rows[0].timestamp, original.timestamp);
    }

    #[tokio::test]
    async fn test_forex_rows_keep_decimal_rates() {
        let store = memory_store().await;
        let now = Utc::now();
        let batch: RecordBatch<ForexRecord> = vec![ForexRecord {
            base_currency: "USD".to_string(),
            target_currency: "EUR".to_string(),
            exchange_rate: dec!(0.91),
            rate_date: None,
            timestamp: now,
            extracted_at: now,
        }]
        .into();
        store.load(&batch).await.unwrap();

        let rows: Vec<ForexRecord> = store.fetch_rows().await.unwrap();

        assert_eq!(rows[0].exchange_rate, dec!(0.91));
        assert!(rows[0].rate_date.is_none());
    }

    #[tokio::test]
    async fn test_record_counts_cover_all_tables() {
        let store = memory_store().await;
        store.load(&RecordBatch::from(vec![stock("AAPL"), stock("IBM")])).await.unwrap();

        let counts = store.record_counts().await.unwrap();

        assert_eq!(
            counts,
            vec![
                (AssetClass::Stocks, 2),
                (AssetClass::Crypto, 0),
                (AssetClass::Forex, 0)
            ]
        );
    }

    #[tokio::test]
    async fn test_load_without_tables_fails() {
        let store = bare_store().await;

        let result = store.load(&RecordBatch::from(vec![stock("AAPL")])).await;

        assert!(matches!(result, Err(DataError::InsertError(_))));
    }
}
