//! `POST /v1/indexes/{name}/search` (spec §6, §4.5 `top-k`).

use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;
use crate::types::{SearchRequest, SearchResponse, SearchResultDto};

pub async fn top_k_search(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let entry = state
        .get(&name)
        .ok_or_else(|| ApiError::NotFound(format!("index {name:?} not found")))?;

    let results = entry.engine.top_k(&req.query, req.k, req.ef, &())?;
    let results = results
        .into_iter()
        .map(|r| SearchResultDto {
            id: r.id.to_string(),
            vector: r.vector,
            distance: r.distance,
        })
        .collect();

    Ok(Json(SearchResponse { results }))
}
