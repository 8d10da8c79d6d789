use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_utils::extractor::JsonBody;

use crate::models::{CreatePrescriptionRequest, PrescriptionError};
use crate::services::PrescriptionService;

fn map_prescription_error(e: PrescriptionError) -> AppError {
    match e {
        PrescriptionError::NotFound | PrescriptionError::PatientNotFound => {
            AppError::NotFound(e.to_string())
        }
        PrescriptionError::ValidationError(msg) => AppError::ValidationError(msg),
        PrescriptionError::NotActive(_) => AppError::Conflict(e.to_string()),
        PrescriptionError::Forbidden(err) => err.into(),
        PrescriptionError::DatabaseError(err) => AppError::Database(err.to_string()),
    }
}

#[axum::debug_handler]
pub async fn create_prescription(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(request): JsonBody<CreatePrescriptionRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = PrescriptionService::new(&state);

    let prescription = service
        .create_prescription(&user, request)
        .await
        .map_err(map_prescription_error)?;

    Ok((StatusCode::CREATED, Json(json!(prescription))))
}

#[axum::debug_handler]
pub async fn get_patient_prescriptions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = PrescriptionService::new(&state);

    let prescriptions = service
        .list_for_patient(&user, &patient_id)
        .await
        .map_err(map_prescription_error)?;

    Ok(Json(json!(prescriptions)))
}

#[axum::debug_handler]
pub async fn get_my_prescriptions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let service = PrescriptionService::new(&state);

    let prescriptions = service.list_own(&user).await.map_err(map_prescription_error)?;

    Ok(Json(json!(prescriptions)))
}

#[axum::debug_handler]
pub async fn get_pending_prescriptions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let service = PrescriptionService::new(&state);

    let prescriptions = service
        .list_pending(&user)
        .await
        .map_err(map_prescription_error)?;

    Ok(Json(json!(prescriptions)))
}

#[axum::debug_handler]
pub async fn fill_prescription(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(prescription_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = PrescriptionService::new(&state);

    let prescription = service
        .fill_prescription(&user, &prescription_id)
        .await
        .map_err(map_prescription_error)?;

    Ok(Json(json!(prescription)))
}

#[axum::debug_handler]
pub async fn cancel_prescription(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(prescription_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = PrescriptionService::new(&state);

    let prescription = service
        .cancel_prescription(&user, &prescription_id)
        .await
        .map_err(map_prescription_error)?;

    Ok(Json(json!(prescription)))
}
