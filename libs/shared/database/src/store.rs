use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document serialization failed: {0}")]
    Serialization(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Duplicate document id: {0}")]
    DuplicateId(String),

    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Eq(String, Value),
    EqIgnoreCase(String, String),
}

impl Condition {
    fn matches(&self, document: &Value) -> bool {
        match self {
            Condition::Eq(field, expected) => document.get(field) == Some(expected),
            Condition::EqIgnoreCase(field, expected) => document
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|actual| actual.to_lowercase() == expected.to_lowercase()),
        }
    }
}

/// Conjunction of field equality conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: impl ToString) -> Self {
        Self::new().eq("id", id.to_string())
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(field.to_string(), value.into()));
        self
    }

    /// Case-insensitive string equality.
    pub fn eq_ignore_case(mut self, field: &str, value: &str) -> Self {
        self.conditions
            .push(Condition::EqIgnoreCase(field.to_string(), value.to_string()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, document: &Value) -> bool {
        self.conditions.iter().all(|condition| condition.matches(document))
    }

    /// PostgREST query pairs, e.g. `status=eq.pending`.
    pub fn to_query(&self) -> Vec<(String, String)> {
        self.conditions
            .iter()
            .map(|condition| match condition {
                Condition::Eq(field, value) => {
                    let raw = match value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (field.clone(), format!("eq.{}", raw))
                }
                Condition::EqIgnoreCase(field, value) => {
                    (field.clone(), format!("ilike.{}", escape_like(value)))
                }
            })
            .collect()
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Minimal document collection interface: insert, filtered find,
/// conditional update and delete. Every document carries a string `id`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, collection: &str, document: Value) -> Result<Value, StoreError>;

    /// Inserts `document` unless an existing document matches any of
    /// `unique_on`, in which case nothing is written and
    /// `StoreError::Conflict` is returned. The check and the write are atomic.
    async fn insert_unique(
        &self,
        collection: &str,
        document: Value,
        unique_on: &[Filter],
    ) -> Result<Value, StoreError>;

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StoreError>;

    /// Applies `patch` to every document matching `filter` and returns the
    /// updated documents. The match and the write are atomic per document,
    /// so a filter on the prior state acts as a precondition.
    async fn update(
        &self,
        collection: &str,
        filter: &Filter,
        patch: Value,
    ) -> Result<Vec<Value>, StoreError>;

    /// `update` that fails with `StoreError::Conflict` when a document
    /// outside `filter` matches any of `unique_on`.
    async fn update_unique(
        &self,
        collection: &str,
        filter: &Filter,
        patch: Value,
        unique_on: &[Filter],
    ) -> Result<Vec<Value>, StoreError>;

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Value>, StoreError> {
        Ok(self.find(collection, filter).await?.into_iter().next())
    }
}

pub fn to_document<T: Serialize>(value: &T) -> Result<Value, StoreError> {
    let document = serde_json::to_value(value)?;
    if !document.is_object() {
        return Err(StoreError::InvalidDocument("document must be an object".to_string()));
    }
    Ok(document)
}

pub fn from_document<T: DeserializeOwned>(document: Value) -> Result<T, StoreError> {
    Ok(serde_json::from_value(document)?)
}
