//! HTTP gateway exposing CRUD over named HNSW indexes (spec §6), built
//! the way the teacher's server crate wires axum: a thin `AppState`,
//! one handler module per resource family, and a router assembled in
//! one place.

mod auth;
mod error;
mod handlers;
mod state;
mod types;

pub use error::{ApiError, ErrorResponse};
pub use state::{AppState, IndexEntry};

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds the full router: versioned routes, bearer-auth middleware,
/// permissive CORS, and request tracing (spec §6).
#[must_use]
pub fn build_router(state: Arc<AppState>) -> Router {
    let routes = Router::new()
        .route("/v1/indexes", get(handlers::list_indexes).post(handlers::create_index))
        .route(
            "/v1/indexes/{name}",
            get(handlers::get_index).delete(handlers::delete_index),
        )
        .route("/v1/indexes/{name}/vectors", post(handlers::add_vector))
        .route("/v1/indexes/{name}/vectors/batch", post(handlers::add_vectors_batch))
        .route("/v1/indexes/{name}/vectors/{id}", axum::routing::delete(handlers::remove_vector))
        .route("/v1/indexes/{name}/search", post(handlers::top_k_search))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_bearer));

    Router::new()
        .merge(routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
