//! In-memory document store.
//!
//! Used when no database is configured and by the test suites. Each
//! operation holds the write lock for its whole duration, which gives the
//! same per-document atomicity the database backend provides.

use super::{Collection, DocumentStore, Filter, PullMatcher, StorageError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<Collection, Vec<Value>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection
    pub async fn count(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, Vec::len)
    }
}

fn has_id(document: &Value, id: &str) -> bool {
    document.get("_id").and_then(Value::as_str) == Some(id)
}

fn find_by_id(documents: &mut [Value], id: Uuid) -> Option<&mut Map<String, Value>> {
    let id = id.to_string();
    documents
        .iter_mut()
        .find(|d| has_id(d, &id))
        .and_then(Value::as_object_mut)
}

fn array_field<'a>(
    collection: Collection,
    document: &'a mut Map<String, Value>,
    field: &str,
) -> Result<&'a mut Vec<Value>, StorageError> {
    let entry = document
        .entry(field.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    entry
        .as_array_mut()
        .ok_or_else(|| StorageError::InvalidDocument {
            collection: collection.to_string(),
            reason: format!("field `{}` is not an array", field),
        })
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, collection: Collection, document: Value) -> Result<Value, StorageError> {
        let Value::Object(mut fields) = document else {
            return Err(StorageError::InvalidDocument {
                collection: collection.to_string(),
                reason: "document must be a JSON object".to_string(),
            });
        };
        if !fields.get("_id").is_some_and(Value::is_string) {
            fields.insert("_id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        let document = Value::Object(fields);

        let mut collections = self.collections.write().await;
        collections
            .entry(collection)
            .or_default()
            .push(document.clone());
        Ok(document)
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<Value>, StorageError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default())
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Value>, StorageError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| filter.matches(d)).cloned()))
    }

    async fn delete(&self, collection: Collection, filter: &Filter) -> Result<bool, StorageError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(false);
        };
        match docs.iter().position(|d| filter.matches(d)) {
            Some(index) => {
                docs.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update(
        &self,
        collection: Collection,
        id: Uuid,
        fields: Map<String, Value>,
    ) -> Result<Option<Value>, StorageError> {
        let mut collections = self.collections.write().await;
        let Some(document) = collections
            .get_mut(&collection)
            .and_then(|docs| find_by_id(docs, id))
        else {
            return Ok(None);
        };

        let mut modified = false;
        for (key, value) in fields {
            if document.get(&key) != Some(&value) {
                document.insert(key, value);
                modified = true;
            }
        }

        Ok(modified.then(|| Value::Object(document.clone())))
    }

    async fn push(
        &self,
        collection: Collection,
        id: Uuid,
        field: &str,
        item: Value,
    ) -> Result<bool, StorageError> {
        let mut collections = self.collections.write().await;
        let Some(document) = collections
            .get_mut(&collection)
            .and_then(|docs| find_by_id(docs, id))
        else {
            return Ok(false);
        };

        array_field(collection, document, field)?.push(item);
        Ok(true)
    }

    async fn pull(
        &self,
        collection: Collection,
        id: Uuid,
        field: &str,
        matcher: &PullMatcher,
    ) -> Result<bool, StorageError> {
        let mut collections = self.collections.write().await;
        let Some(document) = collections
            .get_mut(&collection)
            .and_then(|docs| find_by_id(docs, id))
        else {
            return Ok(false);
        };

        let items = array_field(collection, document, field)?;
        let before = items.len();
        items.retain(|item| !matcher.matches(item));
        Ok(items.len() != before)
    }

    async fn update_in_list(
        &self,
        collection: Collection,
        id: Uuid,
        field: &str,
        item_id: Uuid,
        item: Value,
    ) -> Result<bool, StorageError> {
        let mut collections = self.collections.write().await;
        let Some(document) = collections
            .get_mut(&collection)
            .and_then(|docs| find_by_id(docs, id))
        else {
            return Ok(false);
        };

        let item_id = item_id.to_string();
        let items = array_field(collection, document, field)?;
        match items.iter_mut().find(|existing| has_id(existing, &item_id)) {
            Some(existing) if *existing != item => {
                *existing = item;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
