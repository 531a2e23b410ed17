//! # Markets Core
//!
//! 시장 데이터 ETL의 핵심 타입을 제공합니다:
//! - 자산군 및 정규화 레코드 (주식, 암호화폐, 환율)
//! - 변환 결과 배치
//! - 에러 타입
//! - 로깅 인프라

pub mod error;
pub mod logging;
pub mod record;

pub use error::*;
pub use logging::*;
pub use record::*;
