//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 데이터 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 데이터베이스 연결 오류
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    QueryError(String),

    /// 데이터 삽입 오류
    #[error("Insert error: {0}")]
    InsertError(String),

    /// 연결 풀 소진
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// 잘못된 데이터 형식 (제공자 응답 형태 불일치 등)
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// 파싱 오류 (타입 변환 실패)
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 설정 오류
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => DataError::PoolExhausted,
            sqlx::Error::PoolClosed => DataError::ConnectionError("Pool closed".to_string()),
            sqlx::Error::Io(e) => DataError::ConnectionError(e.to_string()),
            sqlx::Error::Database(db_err) => DataError::QueryError(db_err.message().to_string()),
            _ => DataError::QueryError(err.to_string()),
        }
    }
}

impl DataError {
    /// 재시도하면 성공할 수 있는 에러인지 여부.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DataError::ConnectionError(_)
                | DataError::QueryError(_)
                | DataError::InsertError(_)
                | DataError::PoolExhausted
        )
    }
}

pub type Result<T> = std::result::Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(DataError::PoolExhausted.is_retryable());
        assert!(DataError::InsertError("database is locked".into()).is_retryable());
        assert!(!DataError::ParseError("price".into()).is_retryable());
        assert!(!DataError::ConfigError("url".into()).is_retryable());
    }

    #[test]
    fn test_sqlx_pool_timeout_maps_to_exhausted() {
        let err: DataError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DataError::PoolExhausted));
    }
}
