//! Appends audit records to a model's embedded history.

use super::error::ServiceError;
use crate::models::{HistoryAction, HistoryEntry};
use crate::storage::{Collection, DocumentStore};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

const HISTORY_FIELD: &str = "history";

#[derive(Clone)]
pub struct HistoryLedger {
    store: Arc<dyn DocumentStore>,
}

impl HistoryLedger {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Append one entry. Returns false if the model no longer exists.
    pub async fn record(
        &self,
        model_id: Uuid,
        user_id: &str,
        action: HistoryAction,
    ) -> Result<bool, ServiceError> {
        let entry = HistoryEntry::new(user_id, action);
        let appended = self
            .store
            .push(
                Collection::Model,
                model_id,
                HISTORY_FIELD,
                serde_json::to_value(&entry)?,
            )
            .await?;

        if appended {
            debug!(
                "[History] {} by {} on model {}",
                entry.action.name(),
                user_id,
                model_id
            );
        } else {
            warn!(
                "[History] Model {} vanished before {} could be recorded",
                model_id,
                entry.action.name()
            );
        }
        Ok(appended)
    }
}
