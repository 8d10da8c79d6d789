use axum::{routing::get, Json, Router};
use tower_http::services::ServeDir;

use appointment_cell::appointment_routes;
use auth_cell::auth_routes;
use inventory_cell::inventory_routes;
use prescription_cell::prescription_routes;
use record_cell::record_routes;
use shared_database::AppState;

pub fn create_router(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.config.upload_dir);
    let public = ServeDir::new(&state.config.public_dir);

    Router::new()
        .route(
            "/health",
            get(|| async { Json(serde_json::json!({ "status": "ok" })) }),
        )
        .nest("/auth", auth_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/records", record_routes(state.clone()))
        .nest("/prescriptions", prescription_routes(state.clone()))
        .nest("/inventory", inventory_routes(state))
        .nest_service("/uploads", uploads)
        .fallback_service(public)
}
