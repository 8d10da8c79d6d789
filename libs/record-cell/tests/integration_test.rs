use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use auth_cell::test_support::seed_user;
use record_cell::record_routes;
use shared_database::AppState;
use shared_models::auth::Role;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

#[tokio::test]
async fn test_upload_and_list_over_http() {
    let dir = TempDir::new().unwrap();
    let config = TestConfig {
        upload_dir: dir.path().to_string_lossy().into_owned(),
        ..TestConfig::default()
    };
    let state = AppState::in_memory(config.to_app_config());
    let app = record_routes(state.clone());

    let doctor = seed_user(&state, Role::Doctor).await;
    let patient = seed_user(&state, Role::Patient).await;
    let token = JwtTestUtils::create_test_token(
        &TestUser { id: doctor.id, role: doctor.role },
        &config.jwt_secret,
        Some(1),
    );

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "patientId": patient.id,
                "description": "MRI results",
                "file": { "fileName": "mri.txt", "data": "bXJp" }
            })
            .to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let request = Request::builder()
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert!(body[0]["file_url"].as_str().unwrap().ends_with(".txt"));
}

#[tokio::test]
async fn test_records_require_token() {
    let state = AppState::in_memory(TestConfig::default().to_app_config());
    let app = record_routes(state);

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
