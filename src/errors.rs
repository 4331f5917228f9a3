// errors.rs
use thiserror::Error;

/// Errors raised by the storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database Error: {0}")]
    DbError(String),
    #[error("Schema Error: {0}")]
    SchemaError(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::DbError(e.to_string())
    }
}
