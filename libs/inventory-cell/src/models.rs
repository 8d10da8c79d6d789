use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use security_cell::SecurityError;
use shared_database::StoreError;

pub const DEFAULT_REORDER_LEVEL: i64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryItem {
    pub id: Uuid,
    pub medicine_name: String,
    pub generic_name: String,
    pub category: String,
    pub quantity: i64,
    pub unit: String,
    pub price_per_unit: f64,
    pub supplier: String,
    pub expiry_date: DateTime<Utc>,
    pub reorder_level: i64,
    pub batch_number: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of both create and update. On create every field except
/// `reorderLevel` is required; on update only the supplied fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryInput {
    pub medicine_name: Option<String>,
    pub generic_name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<i64>,
    pub unit: Option<String>,
    pub price_per_unit: Option<f64>,
    pub supplier: Option<String>,
    pub expiry_date: Option<String>,
    pub reorder_level: Option<i64>,
    pub batch_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("Medicine not found")]
    NotFound,

    #[error("A medicine named {0} already exists")]
    DuplicateName(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Forbidden(#[from] SecurityError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] StoreError),
}
