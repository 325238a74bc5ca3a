use axum::http::Method;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all seqstore endpoints.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handler::health_handler))
        .route(
            "/entities",
            post(handler::post_entity).put(handler::put_missing_id),
        )
        .route("/entities/:id", put(handler::put_entity))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
