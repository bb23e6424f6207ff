//! Audit history embedded in every model document.
//!
//! Entries are only ever appended. The store appends them with an atomic
//! array push; `History` itself exposes no way to edit or reorder entries.

use super::attribute::Attribute;
use super::model::ModelContent;
use super::relation::Relation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum HistoryAction {
    CreateModel {
        item: ModelContent,
    },
    AddAttribute {
        item: Attribute,
    },
    #[serde(rename_all = "camelCase")]
    RemoveAttribute {
        item_id: Uuid,
    },
    UpdateAttribute {
        old: Attribute,
        new: Attribute,
    },
    CreateRelation {
        item: Relation,
    },
    UpdateRelation {
        old: Relation,
        new: Relation,
    },
    #[serde(rename_all = "camelCase")]
    RemoveRelation {
        item_id: Uuid,
    },
}

impl HistoryAction {
    pub fn name(&self) -> &'static str {
        match self {
            HistoryAction::CreateModel { .. } => "createModel",
            HistoryAction::AddAttribute { .. } => "addAttribute",
            HistoryAction::RemoveAttribute { .. } => "removeAttribute",
            HistoryAction::UpdateAttribute { .. } => "updateAttribute",
            HistoryAction::CreateRelation { .. } => "createRelation",
            HistoryAction::UpdateRelation { .. } => "updateRelation",
            HistoryAction::RemoveRelation { .. } => "removeRelation",
        }
    }
}

/// A single immutable audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub action: HistoryAction,
}

impl HistoryEntry {
    pub fn new(user_id: &str, action: HistoryAction) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            timestamp: Utc::now(),
            action,
        }
    }
}

/// Insertion-ordered, append-only list of history entries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History(Vec<HistoryEntry>);

impl History {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn append(&mut self, entry: HistoryEntry) {
        self.0.push(entry);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.0.iter()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.0.last()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
