//! 테이블 CSV 내보내기.

use crate::error::Result;
use markets_core::{AssetClass, CryptoRecord, ForexRecord, StockRecord};
use markets_data::{RecordStore, TableRecord};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// 레코드를 헤더와 함께 CSV로 씁니다. 작성한 행 수를 반환합니다.
pub fn write_csv<R: Serialize, W: Write>(rows: &[R], writer: W) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(rows.len())
}

async fn export_rows<R>(store: &RecordStore, output: &Path) -> Result<usize>
where
    R: TableRecord + Serialize,
{
    let rows: Vec<R> = store.fetch_rows().await?;
    let file = std::fs::File::create(output)?;
    write_csv(&rows, file)
}

/// 자산군 테이블 전체를 CSV 파일로 내보냅니다.
pub async fn export_table(store: &RecordStore, asset: AssetClass, output: &Path) -> Result<usize> {
    if let Some(dir) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    let count = match asset {
        AssetClass::Stocks => export_rows::<StockRecord>(store, output).await?,
        AssetClass::Crypto => export_rows::<CryptoRecord>(store, output).await?,
        AssetClass::Forex => export_rows::<ForexRecord>(store, output).await?,
    };

    info!(table = %asset, count, path = %output.display(), "CSV 내보내기 완료");
    Ok(count)
}
