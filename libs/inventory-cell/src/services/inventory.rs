use std::sync::Arc;

use chrono::{DateTime, Utc};
use regex::RegexBuilder;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use security_cell::{AccessPolicy, Action};
use shared_database::{from_document, to_document, AppState, DocumentStore, Filter, StoreError};
use shared_models::auth::AuthUser;
use shared_utils::dates::parse_datetime;

use crate::models::{InventoryError, InventoryInput, InventoryItem, DEFAULT_REORDER_LEVEL};

pub const INVENTORY_COLLECTION: &str = "inventory";

fn invalid(msg: impl Into<String>) -> InventoryError {
    InventoryError::ValidationError(msg.into())
}

fn non_empty(value: &str, field: &str) -> Result<String, InventoryError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid(format!("{} cannot be empty", field)));
    }
    Ok(trimmed.to_string())
}

fn required_text(value: Option<&str>, field: &str) -> Result<String, InventoryError> {
    value
        .ok_or_else(|| invalid(format!("{} is required", field)))
        .and_then(|v| non_empty(v, field))
}

fn checked_quantity(quantity: i64) -> Result<i64, InventoryError> {
    if quantity < 0 {
        return Err(invalid("quantity cannot be negative"));
    }
    Ok(quantity)
}

fn checked_price(price: f64) -> Result<f64, InventoryError> {
    if !price.is_finite() || price < 0.0 {
        return Err(invalid("pricePerUnit cannot be negative"));
    }
    Ok(price)
}

fn checked_reorder_level(level: i64) -> Result<i64, InventoryError> {
    if level < 0 {
        return Err(invalid("reorderLevel cannot be negative"));
    }
    Ok(level)
}

fn checked_expiry(raw: &str) -> Result<DateTime<Utc>, InventoryError> {
    parse_datetime(raw).ok_or_else(|| invalid("Invalid expiryDate format"))
}

fn parse_id(raw: &str) -> Result<Uuid, InventoryError> {
    Uuid::parse_str(raw.trim()).map_err(|_| invalid("Invalid medicine id format"))
}

fn active() -> Filter {
    Filter::new().eq("is_active", true)
}

/// Active medicine names are unique regardless of case.
fn name_taken(name: &str) -> [Filter; 1] {
    [active().eq_ignore_case("medicine_name", name)]
}

fn duplicate_or(e: StoreError, name: &str) -> InventoryError {
    match e {
        StoreError::Conflict(_) => {
            warn!("Duplicate medicine name rejected: {}", name);
            InventoryError::DuplicateName(name.to_string())
        }
        other => other.into(),
    }
}

pub struct InventoryService {
    store: Arc<dyn DocumentStore>,
    policy: AccessPolicy,
    low_stock_threshold: i64,
}

impl InventoryService {
    pub fn new(state: &AppState) -> Self {
        Self::with_store(state.store.clone(), state.config.low_stock_threshold)
    }

    pub fn with_store(store: Arc<dyn DocumentStore>, low_stock_threshold: i64) -> Self {
        Self {
            store,
            policy: AccessPolicy::new(),
            low_stock_threshold,
        }
    }

    async fn active_items(&self) -> Result<Vec<InventoryItem>, InventoryError> {
        Ok(self
            .store
            .find(INVENTORY_COLLECTION, &active())
            .await?
            .into_iter()
            .map(from_document::<InventoryItem>)
            .collect::<Result<Vec<_>, _>>()?)
    }

    pub async fn add_item(
        &self,
        user: &AuthUser,
        input: InventoryInput,
    ) -> Result<InventoryItem, InventoryError> {
        self.policy.require_role(user, Action::ManageInventory)?;
        debug!("Adding inventory item by {}", user.id);

        let medicine_name = required_text(input.medicine_name.as_deref(), "medicineName")?;
        let generic_name = required_text(input.generic_name.as_deref(), "genericName")?;
        let category = required_text(input.category.as_deref(), "category")?;
        let unit = required_text(input.unit.as_deref(), "unit")?;
        let supplier = required_text(input.supplier.as_deref(), "supplier")?;
        let batch_number = required_text(input.batch_number.as_deref(), "batchNumber")?;
        let quantity = checked_quantity(input.quantity.ok_or_else(|| invalid("quantity is required"))?)?;
        let price_per_unit =
            checked_price(input.price_per_unit.ok_or_else(|| invalid("pricePerUnit is required"))?)?;
        let expiry_date = checked_expiry(
            input
                .expiry_date
                .as_deref()
                .ok_or_else(|| invalid("expiryDate is required"))?,
        )?;
        let reorder_level =
            checked_reorder_level(input.reorder_level.unwrap_or(DEFAULT_REORDER_LEVEL))?;

        let now = Utc::now();
        let item = InventoryItem {
            id: Uuid::new_v4(),
            medicine_name,
            generic_name,
            category,
            quantity,
            unit,
            price_per_unit,
            supplier,
            expiry_date,
            reorder_level,
            batch_number,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let created = self
            .store
            .insert_unique(INVENTORY_COLLECTION, to_document(&item)?, &name_taken(&item.medicine_name))
            .await
            .map_err(|e| duplicate_or(e, &item.medicine_name))?;
        let item: InventoryItem = from_document(created)?;

        info!("Inventory item {} ({}) added", item.id, item.medicine_name);
        Ok(item)
    }

    pub async fn list_items(&self, user: &AuthUser) -> Result<Vec<InventoryItem>, InventoryError> {
        self.policy.require_role(user, Action::ViewInventory)?;

        let mut items = self.active_items().await?;
        items.sort_by(|a, b| a.medicine_name.cmp(&b.medicine_name));
        Ok(items)
    }

    pub async fn update_item(
        &self,
        user: &AuthUser,
        item_id: &str,
        input: InventoryInput,
    ) -> Result<InventoryItem, InventoryError> {
        self.policy.require_role(user, Action::ManageInventory)?;
        let id = parse_id(item_id)?;

        let mut patch = Map::new();
        let mut set = |field: &str, value: Value| {
            patch.insert(field.to_string(), value);
        };

        if let Some(name) = input.medicine_name.as_deref() {
            set("medicine_name", Value::from(non_empty(name, "medicineName")?));
        }
        if let Some(generic) = input.generic_name.as_deref() {
            set("generic_name", Value::from(non_empty(generic, "genericName")?));
        }
        if let Some(category) = input.category.as_deref() {
            set("category", Value::from(non_empty(category, "category")?));
        }
        if let Some(unit) = input.unit.as_deref() {
            set("unit", Value::from(non_empty(unit, "unit")?));
        }
        if let Some(supplier) = input.supplier.as_deref() {
            set("supplier", Value::from(non_empty(supplier, "supplier")?));
        }
        if let Some(batch) = input.batch_number.as_deref() {
            set("batch_number", Value::from(non_empty(batch, "batchNumber")?));
        }
        if let Some(quantity) = input.quantity {
            set("quantity", Value::from(checked_quantity(quantity)?));
        }
        if let Some(price) = input.price_per_unit {
            set("price_per_unit", Value::from(checked_price(price)?));
        }
        if let Some(level) = input.reorder_level {
            set("reorder_level", Value::from(checked_reorder_level(level)?));
        }
        if let Some(expiry) = input.expiry_date.as_deref() {
            set("expiry_date", to_document(&checked_expiry(expiry)?)?);
        }
        set("updated_at", to_document(&Utc::now())?);

        let renamed_to = patch
            .get("medicine_name")
            .and_then(Value::as_str)
            .map(str::to_string);

        let guard = Filter::by_id(id).eq("is_active", true);
        let updated = match renamed_to {
            Some(name) => self
                .store
                .update_unique(INVENTORY_COLLECTION, &guard, Value::Object(patch), &name_taken(&name))
                .await
                .map_err(|e| duplicate_or(e, &name))?,
            None => {
                self.store
                    .update(INVENTORY_COLLECTION, &guard, Value::Object(patch))
                    .await?
            }
        };

        let item: InventoryItem = match updated.into_iter().next() {
            Some(document) => from_document(document)?,
            None => return Err(InventoryError::NotFound),
        };

        info!("Inventory item {} updated by {}", id, user.id);
        Ok(item)
    }

    /// Soft delete: the row stays but drops out of every listing.
    pub async fn remove_item(&self, user: &AuthUser, item_id: &str) -> Result<(), InventoryError> {
        self.policy.require_role(user, Action::ManageInventory)?;
        let id = parse_id(item_id)?;

        let guard = Filter::by_id(id).eq("is_active", true);
        let patch = serde_json::json!({
            "is_active": false,
            "updated_at": Utc::now(),
        });

        let updated = self.store.update(INVENTORY_COLLECTION, &guard, patch).await?;
        if updated.is_empty() {
            return Err(InventoryError::NotFound);
        }

        info!("Inventory item {} deactivated by {}", id, user.id);
        Ok(())
    }

    pub async fn low_stock(&self, user: &AuthUser) -> Result<Vec<InventoryItem>, InventoryError> {
        self.policy.require_role(user, Action::ViewLowStock)?;

        let mut items: Vec<InventoryItem> = self
            .active_items()
            .await?
            .into_iter()
            .filter(|item| item.quantity <= self.low_stock_threshold)
            .collect();
        items.sort_by_key(|item| item.quantity);
        Ok(items)
    }

    pub async fn search(
        &self,
        user: &AuthUser,
        query: Option<&str>,
    ) -> Result<Vec<InventoryItem>, InventoryError> {
        self.policy.require_role(user, Action::ViewInventory)?;

        let query = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| invalid("query is required"))?;

        // Escaped so user input is always a literal substring.
        let pattern = RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()
            .map_err(|e| invalid(format!("Invalid search query: {}", e)))?;

        let mut items: Vec<InventoryItem> = self
            .active_items()
            .await?
            .into_iter()
            .filter(|item| pattern.is_match(&item.medicine_name) || pattern.is_match(&item.generic_name))
            .collect();
        items.sort_by(|a, b| a.medicine_name.cmp(&b.medicine_name));
        Ok(items)
    }
}
