//! 정규화 레코드 저장소.
//!
//! - `sqlite` - 연결 풀, 테이블 생성, 배치 적재, 조회
//! - `table` - 레코드 타입 ↔ 테이블 행 매핑

pub mod sqlite;
pub mod table;

pub use sqlite::{DatabaseConfig, RecordStore};
pub use table::TableRecord;
