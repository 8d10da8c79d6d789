use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

// Attachments arrive base64-encoded inside the JSON body.
const MAX_UPLOAD_BODY_BYTES: usize = 15 * 1024 * 1024;

pub fn record_routes(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::list_records).post(handlers::upload_record))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
