//! Bearer-token authentication middleware (spec §6: "Bearer header
//! identifies the caller; a single configured admin key is required;
//! 401 on mismatch").
//!
//! The rest of the pack has no precedent for bearer auth, so this is
//! written from scratch in axum's middleware idiom rather than adapted
//! from an existing handler.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Serialize)]
struct Unauthorized {
    error: &'static str,
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(Unauthorized { error: "missing or invalid bearer token" }),
    )
        .into_response()
}

/// Requires `Authorization: Bearer <admin_key>` on every request it
/// guards. `OPTIONS` is let through unauthenticated so CORS preflight
/// succeeds (spec §6 "permissive on OPTIONS").
pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    if req.method() == axum::http::Method::OPTIONS {
        return next.run(req).await;
    }

    let header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) if token == state.admin_key => next.run(req).await,
        _ => unauthorized(),
    }
}
