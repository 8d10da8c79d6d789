// libs/appointment-cell/src/handlers.rs
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

use crate::models::{AppointmentError, CreateAppointmentRequest};
use crate::services::appointment::AppointmentService;

fn map_appointment_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::NotFound
        | AppointmentError::DoctorNotFound
        | AppointmentError::PatientNotFound => AppError::NotFound(e.to_string()),
        AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
        AppointmentError::InvalidStatusTransition(status) => {
            AppError::Conflict(format!("Appointment is already {}", status))
        }
        AppointmentError::TransitionNotPermitted { .. } => AppError::Forbidden(e.to_string()),
        AppointmentError::Forbidden(err) => err.into(),
        AppointmentError::DatabaseError(err) => AppError::Database(err.to_string()),
    }
}

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(request): JsonBody<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = AppointmentService::new(&state);

    let appointment = service
        .create_appointment(&user, request)
        .await
        .map_err(map_appointment_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": appointment.id,
            "status": appointment.status,
            "appointment": appointment,
            "message": "Appointment request submitted successfully. It will be reviewed by a nurse."
        })),
    ))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentService::new(&state);

    let appointments = service
        .list_appointments(&user)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(appointments)))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentService::new(&state);

    let appointment = service
        .get_appointment(&user, &appointment_id)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn approve_appointment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentService::new(&state);

    let appointment = service
        .approve_appointment(&user, &appointment_id)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "appointment": appointment,
        "message": "Appointment approved successfully."
    })))
}

#[axum::debug_handler]
pub async fn deny_appointment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentService::new(&state);

    let appointment = service
        .deny_appointment(&user, &appointment_id)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "appointment": appointment,
        "message": "Appointment denied successfully."
    })))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentService::new(&state);

    let appointment = service
        .complete_appointment(&user, &appointment_id)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "appointment": appointment,
        "message": "Appointment marked as completed."
    })))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentService::new(&state);

    service
        .delete_appointment(&user, &appointment_id)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({ "message": "Appointment deleted." })))
}
