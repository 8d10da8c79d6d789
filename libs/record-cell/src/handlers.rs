use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_utils::extractor::JsonBody;

use crate::models::{RecordError, UploadRecordRequest};
use crate::services::RecordService;

fn map_record_error(e: RecordError) -> AppError {
    match e {
        RecordError::PatientNotFound => AppError::NotFound(e.to_string()),
        RecordError::ValidationError(msg) => AppError::ValidationError(msg),
        RecordError::FileStorage(msg) => AppError::Internal(msg),
        RecordError::Forbidden(err) => err.into(),
        RecordError::DatabaseError(err) => AppError::Database(err.to_string()),
    }
}

#[axum::debug_handler]
pub async fn upload_record(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(request): JsonBody<UploadRecordRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = RecordService::new(&state);

    let record = service
        .upload_record(&user, request)
        .await
        .map_err(map_record_error)?;

    Ok((StatusCode::CREATED, Json(json!(record))))
}

#[axum::debug_handler]
pub async fn list_records(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let service = RecordService::new(&state);

    let records = service.list_records(&user).await.map_err(map_record_error)?;

    Ok(Json(json!(records)))
}
