use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;

use crate::store::{DocumentStore, Filter, StoreError};

/// Process-local store used when no database is configured and under test.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn document_id(document: &Value) -> Result<String, StoreError> {
    document
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| StoreError::InvalidDocument("document has no string id".to_string()))
}

fn patch_fields(patch: Value) -> Result<Map<String, Value>, StoreError> {
    let fields = match patch {
        Value::Object(fields) => fields,
        _ => return Err(StoreError::InvalidDocument("patch must be an object".to_string())),
    };
    if fields.contains_key("id") {
        return Err(StoreError::InvalidDocument("id cannot be patched".to_string()));
    }
    Ok(fields)
}

fn violated<'a>(
    docs: impl IntoIterator<Item = &'a Value>,
    unique_on: &[Filter],
) -> Option<String> {
    docs.into_iter()
        .find(|doc| unique_on.iter().any(|unique| unique.matches(doc)))
        .map(|doc| doc.get("id").and_then(Value::as_str).unwrap_or_default().to_string())
}

fn apply_patch(docs: &mut [Value], filter: &Filter, fields: &Map<String, Value>) -> Vec<Value> {
    let mut updated = Vec::new();
    for doc in docs.iter_mut().filter(|doc| filter.matches(doc)) {
        if let Value::Object(existing) = doc {
            for (key, value) in fields {
                existing.insert(key.clone(), value.clone());
            }
        }
        updated.push(doc.clone());
    }
    updated
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, document: Value) -> Result<Value, StoreError> {
        self.insert_unique(collection, document, &[]).await
    }

    async fn insert_unique(
        &self,
        collection: &str,
        document: Value,
        unique_on: &[Filter],
    ) -> Result<Value, StoreError> {
        let id = document_id(&document)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        if docs.iter().any(|doc| doc.get("id").and_then(Value::as_str) == Some(id.as_str())) {
            return Err(StoreError::DuplicateId(id));
        }
        if let Some(existing) = violated(docs.iter(), unique_on) {
            debug!("Insert into {} conflicts with {}", collection, existing);
            return Err(StoreError::Conflict(format!("{} conflicts with {}", collection, existing)));
        }

        debug!("Inserting document {} into {}", id, collection);
        docs.push(document.clone());
        Ok(document)
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|doc| filter.matches(doc)).cloned().collect())
            .unwrap_or_default())
    }

    async fn update(
        &self,
        collection: &str,
        filter: &Filter,
        patch: Value,
    ) -> Result<Vec<Value>, StoreError> {
        self.update_unique(collection, filter, patch, &[]).await
    }

    async fn update_unique(
        &self,
        collection: &str,
        filter: &Filter,
        patch: Value,
        unique_on: &[Filter],
    ) -> Result<Vec<Value>, StoreError> {
        let fields = patch_fields(patch)?;

        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(Vec::new());
        };

        let others = docs.iter().filter(|doc| !filter.matches(doc));
        if let Some(existing) = violated(others, unique_on) {
            debug!("Update in {} conflicts with {}", collection, existing);
            return Err(StoreError::Conflict(format!("{} conflicts with {}", collection, existing)));
        }

        let updated = apply_patch(docs, filter, &fields);
        debug!("Updated {} document(s) in {}", updated.len(), collection);
        Ok(updated)
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let before = docs.len();
        docs.retain(|doc| !filter.matches(doc));
        Ok((before - docs.len()) as u64)
    }
}
