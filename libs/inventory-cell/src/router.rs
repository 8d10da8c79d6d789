use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn inventory_routes(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::list_medicines).post(handlers::add_medicine))
        .route("/low-stock", get(handlers::low_stock))
        .route("/search", get(handlers::search_medicines))
        .route(
            "/{item_id}",
            put(handlers::update_medicine).delete(handlers::delete_medicine),
        )
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
