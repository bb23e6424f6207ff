//! Document store adapter contract.
//!
//! Documents are opaque JSON objects keyed by a string `_id`. Every method
//! touches at most one document atomically; nothing spans documents.

use super::StorageError;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Collections used by the collaboration server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Diagram,
    Model,
    ModelRepresentation,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Diagram => "diagram",
            Collection::Model => "model",
            Collection::ModelRepresentation => "model_representation",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    /// Top-level field equals the value
    Equals(String, Value),
    /// Top-level array field holds the value
    Contains(String, Value),
}

/// Conjunction of equality/membership conditions on top-level fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: Uuid) -> Self {
        Self::new().eq("_id", id)
    }

    pub fn eq(mut self, field: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.conditions
            .push(Condition::Equals(field.to_string(), value));
        self
    }

    pub fn contains(mut self, field: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.conditions
            .push(Condition::Contains(field.to_string(), value));
        self
    }

    pub fn matches(&self, document: &Value) -> bool {
        self.conditions.iter().all(|condition| match condition {
            Condition::Equals(field, value) => document.get(field) == Some(value),
            Condition::Contains(field, value) => document
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.contains(value)),
        })
    }

    /// JSON object such that `document @> object` holds exactly when the filter matches.
    pub fn to_containment(&self) -> Value {
        let mut object = Map::new();
        for condition in &self.conditions {
            match condition {
                Condition::Equals(field, value) => {
                    object.insert(field.clone(), value.clone());
                }
                Condition::Contains(field, value) => {
                    let entry = object
                        .entry(field.clone())
                        .or_insert_with(|| Value::Array(Vec::new()));
                    if let Value::Array(items) = entry {
                        items.push(value.clone());
                    }
                }
            }
        }
        Value::Object(object)
    }
}

/// Selects which array elements a `pull` removes.
#[derive(Debug, Clone, PartialEq)]
pub enum PullMatcher {
    /// Elements equal to the value
    Value(Value),
    /// Object elements matching the filter
    Where(Filter),
}

impl PullMatcher {
    pub fn id(id: Uuid) -> Self {
        PullMatcher::Value(Value::String(id.to_string()))
    }

    pub fn item_id(id: Uuid) -> Self {
        PullMatcher::Where(Filter::by_id(id))
    }

    pub fn matches(&self, item: &Value) -> bool {
        match self {
            PullMatcher::Value(value) => item == value,
            PullMatcher::Where(filter) => item.is_object() && filter.matches(item),
        }
    }

    pub fn to_containment(&self) -> Value {
        match self {
            PullMatcher::Value(value) => value.clone(),
            PullMatcher::Where(filter) => filter.to_containment(),
        }
    }
}

/// Left outer join description.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSpec {
    pub local: Collection,
    pub local_field: &'static str,
    pub foreign: Collection,
    pub foreign_field: &'static str,
    pub to_field: &'static str,
    /// Emit one document per foreign match instead of an array; locals without a match are dropped
    pub unwind: bool,
}

/// Storage backend trait for the generic document store
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document, assigning an `_id` when missing. Returns the stored document.
    async fn insert(&self, collection: Collection, document: Value) -> Result<Value, StorageError>;

    /// All documents matching the filter, in insertion order
    async fn find(&self, collection: Collection, filter: &Filter)
    -> Result<Vec<Value>, StorageError>;

    /// First document matching the filter
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Value>, StorageError>;

    /// Delete the first matching document. Returns true if one was deleted.
    async fn delete(&self, collection: Collection, filter: &Filter) -> Result<bool, StorageError>;

    /// Set top-level fields on a document. Returns the updated document only if something changed.
    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        fields: Map<String, Value>,
    ) -> Result<Option<Value>, StorageError>;

    /// Append an item to an array field. Returns true if the document was modified.
    async fn push(
        &self,
        collection: Collection,
        id: Uuid,
        field: &str,
        item: Value,
    ) -> Result<bool, StorageError>;

    /// Remove matching items from an array field. Returns true if anything was removed.
    async fn pull(
        &self,
        collection: Collection,
        id: Uuid,
        field: &str,
        matcher: &PullMatcher,
    ) -> Result<bool, StorageError>;

    /// Replace the array element whose `_id` equals `item_id`. Returns true if it changed.
    async fn update_in_list(
        &self,
        collection: Collection,
        id: Uuid,
        field: &str,
        item_id: Uuid,
        item: Value,
    ) -> Result<bool, StorageError>;

    /// Attach foreign documents to each matching local document.
    async fn join(&self, spec: &JoinSpec, filter: &Filter) -> Result<Vec<Value>, StorageError> {
        let locals = self.find(spec.local, filter).await?;
        let mut joined = Vec::with_capacity(locals.len());

        for local in locals {
            let key = local.get(spec.local_field).cloned().unwrap_or(Value::Null);
            let matches = self
                .find(spec.foreign, &Filter::new().eq(spec.foreign_field, key))
                .await?;

            if spec.unwind {
                for foreign in matches {
                    let mut document = local.clone();
                    if let Value::Object(fields) = &mut document {
                        fields.insert(spec.to_field.to_string(), foreign);
                    }
                    joined.push(document);
                }
            } else {
                let mut document = local;
                if let Value::Object(fields) = &mut document {
                    fields.insert(spec.to_field.to_string(), Value::Array(matches));
                }
                joined.push(document);
            }
        }

        Ok(joined)
    }
}
