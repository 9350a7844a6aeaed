//! 저장소 오류 타입.

use thiserror::Error;

/// 저장소 관련 오류.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 레코드를 찾을 수 없음
    #[error("Record not found: {0}")]
    NotFound(String),

    /// 중복 레코드 (고유 제약 조건 위반)
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// 버전 불일치 (다른 쓰기가 먼저 커밋됨)
    #[error("Version conflict: {0}")]
    Conflict(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    Query(String),

    /// 데이터베이스 연결 오류
    #[error("Database connection error: {0}")]
    Connection(String),

    /// 마이그레이션 오류
    #[error("Migration error: {0}")]
    Migration(String),

    /// 직렬화/역직렬화 오류
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// 재시도로 해결될 수 있는 오류인지 여부.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("Row not found".to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::Connection(err.to_string())
            }
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) => StoreError::Connection(err.to_string()),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().unwrap_or_default();
                match code.as_ref() {
                    // PostgreSQL 고유 제약 조건 위반
                    "23505" => StoreError::Duplicate(db_err.message().to_string()),
                    // 직렬화 실패 (동시 트랜잭션 충돌)
                    "40001" => StoreError::Conflict(db_err.message().to_string()),
                    _ => StoreError::Query(db_err.message().to_string()),
                }
            }
            sqlx::Error::Decode(e) => StoreError::Serialization(e.to_string()),
            _ => StoreError::Query(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Migration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
