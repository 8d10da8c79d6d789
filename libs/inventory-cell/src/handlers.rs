use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_utils::extractor::JsonBody;

use crate::models::{InventoryError, InventoryInput, SearchQuery};
use crate::services::InventoryService;

fn map_inventory_error(e: InventoryError) -> AppError {
    match e {
        InventoryError::NotFound => AppError::NotFound(e.to_string()),
        InventoryError::DuplicateName(_) => AppError::Conflict(e.to_string()),
        InventoryError::ValidationError(msg) => AppError::ValidationError(msg),
        InventoryError::Forbidden(err) => err.into(),
        InventoryError::DatabaseError(err) => AppError::Database(err.to_string()),
    }
}

#[axum::debug_handler]
pub async fn add_medicine(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(input): JsonBody<InventoryInput>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let item = InventoryService::new(&state)
        .add_item(&user, input)
        .await
        .map_err(map_inventory_error)?;

    Ok((StatusCode::CREATED, Json(json!(item))))
}

#[axum::debug_handler]
pub async fn list_medicines(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let items = InventoryService::new(&state)
        .list_items(&user)
        .await
        .map_err(map_inventory_error)?;

    Ok(Json(json!(items)))
}

#[axum::debug_handler]
pub async fn update_medicine(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(item_id): Path<String>,
    JsonBody(input): JsonBody<InventoryInput>,
) -> Result<Json<Value>, AppError> {
    let item = InventoryService::new(&state)
        .update_item(&user, &item_id, input)
        .await
        .map_err(map_inventory_error)?;

    Ok(Json(json!(item)))
}

#[axum::debug_handler]
pub async fn delete_medicine(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(item_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    InventoryService::new(&state)
        .remove_item(&user, &item_id)
        .await
        .map_err(map_inventory_error)?;

    Ok(Json(json!({ "message": "Medicine deleted successfully" })))
}

#[axum::debug_handler]
pub async fn low_stock(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let items = InventoryService::new(&state)
        .low_stock(&user)
        .await
        .map_err(map_inventory_error)?;

    Ok(Json(json!(items)))
}

#[axum::debug_handler]
pub async fn search_medicines(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Value>, AppError> {
    let items = InventoryService::new(&state)
        .search(&user, params.query.as_deref())
        .await
        .map_err(map_inventory_error)?;

    Ok(Json(json!(items)))
}
