use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn prescription_routes(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/", post(handlers::create_prescription))
        .route("/mine", get(handlers::get_my_prescriptions))
        .route("/pending", get(handlers::get_pending_prescriptions))
        .route("/patient/{patient_id}", get(handlers::get_patient_prescriptions))
        .route("/{prescription_id}/fill", patch(handlers::fill_prescription))
        .route("/{prescription_id}/cancel", patch(handlers::cancel_prescription))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
