//! Service-layer error types.

use crate::storage::StorageError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Malformed document: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Update or removal targeted an embedded list item that does not exist
    #[error("doc:{document_id},field:{field},identifier:{identifier}")]
    ListItemNotFound {
        document_id: Uuid,
        field: &'static str,
        identifier: Uuid,
    },
}

pub(crate) fn parse<T: serde::de::DeserializeOwned>(
    document: serde_json::Value,
) -> Result<T, ServiceError> {
    Ok(serde_json::from_value(document)?)
}
