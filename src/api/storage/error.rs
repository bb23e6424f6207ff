//! Storage error types for the document store adapters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage operation errors.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageError {
    /// Database connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),
    /// Query failed while executing
    #[error("Query error: {0}")]
    QueryError(String),
    /// Document does not have the shape the operation needs
    #[error("Invalid document in {collection}: {reason}")]
    InvalidDocument { collection: String, reason: String },
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StorageError::ConnectionError(e.to_string())
            }
            other => StorageError::QueryError(other.to_string()),
        }
    }
}
