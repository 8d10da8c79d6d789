use axum::{
    extract::{Extension, Json, State},
    http::{HeaderMap, StatusCode},
};
use serde_json::{json, Value};
use tracing::debug;

use security_cell::{AccessPolicy, Action};
use shared_database::AppState;
use shared_models::auth::{AuthUser, TokenResponse};
use shared_models::error::AppError;
use shared_utils::extractor::{bearer_token, JsonBody};
use shared_utils::jwt;

use crate::models::{
    AuthError, DashboardResponse, LoginRequest, LoginResponse, PharmacistRegisterRequest,
    RegisterRequest, UserProfile,
};
use crate::services::AuthService;

pub(crate) fn map_auth_error(e: AuthError) -> AppError {
    match e {
        AuthError::Validation(msg) => AppError::ValidationError(msg),
        AuthError::InvalidRole => AppError::ValidationError(e.to_string()),
        AuthError::UserExists => AppError::Conflict(e.to_string()),
        AuthError::InvalidCredentials => AppError::Auth(e.to_string()),
        AuthError::NotFound => AppError::NotFound(e.to_string()),
        AuthError::Token(msg) => AppError::Internal(msg),
        AuthError::Security(err) => err.into(),
        AuthError::Store(err) => AppError::Database(err.to_string()),
    }
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = AuthService::new(&state);
    let user = service.register(request).await.map_err(map_auth_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully.",
            "user": UserProfile::from(&user)
        })),
    ))
}

pub async fn register_pharmacist(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<PharmacistRegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = AuthService::new(&state);
    let (user, token) = service
        .register_pharmacist(request)
        .await
        .map_err(map_auth_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "token": token,
            "user": UserProfile::from(&user)
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let service = AuthService::new(&state);
    let response = service.login(request).await.map_err(map_auth_error)?;
    Ok(Json(response))
}

pub async fn dashboard(Extension(user): Extension<AuthUser>) -> Json<DashboardResponse> {
    debug!("Building dashboard for {}", user.role);
    Json(AuthService::dashboard(user.role))
}

pub async fn list_doctors(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    AccessPolicy::new().require_role(&user, Action::ListDoctors)?;

    let service = AuthService::new(&state);
    let doctors = service.list_doctors().await.map_err(map_auth_error)?;

    Ok(Json(json!(doctors)))
}

pub async fn validate_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = bearer_token(&headers)?;

    let user = jwt::validate_token(&token, &state.config.jwt_secret).map_err(AppError::Auth)?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: user.id,
        role: user.role,
    }))
}

pub async fn verify_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    debug!("Verifying token");

    let token = bearer_token(&headers)?;
    let valid = jwt::validate_token(&token, &state.config.jwt_secret).is_ok();

    Ok(Json(json!({ "valid": valid })))
}
