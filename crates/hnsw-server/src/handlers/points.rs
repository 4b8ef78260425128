//! Vector CRUD within a named index: add (single/batch), remove (spec §6).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use hnsw_core::NodeId;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;
use crate::types::{AddVectorRequest, AddVectorsBatchRequest};

fn parse_id(raw: &str) -> Result<NodeId, ApiError> {
    NodeId::from_str(raw).map_err(|_| ApiError::InvalidArgument(format!("invalid node id: {raw:?}")))
}

pub async fn add_vector(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<AddVectorRequest>,
) -> Result<StatusCode, ApiError> {
    let entry = state
        .get(&name)
        .ok_or_else(|| ApiError::NotFound(format!("index {name:?} not found")))?;
    let id = parse_id(&req.id)?;
    entry.engine.add(id, req.vector, &())?;
    Ok(StatusCode::CREATED)
}

pub async fn add_vectors_batch(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<AddVectorsBatchRequest>,
) -> Result<StatusCode, ApiError> {
    let entry = state
        .get(&name)
        .ok_or_else(|| ApiError::NotFound(format!("index {name:?} not found")))?;
    let mut items = Vec::with_capacity(req.vectors.len());
    for v in req.vectors {
        items.push((parse_id(&v.id)?, v.vector));
    }
    entry.engine.add_batch(items, &())?;
    Ok(StatusCode::CREATED)
}

pub async fn remove_vector(
    State(state): State<Arc<AppState>>,
    Path((name, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let entry = state
        .get(&name)
        .ok_or_else(|| ApiError::NotFound(format!("index {name:?} not found")))?;
    let id = parse_id(&id)?;
    entry.engine.remove(id, &())?;
    Ok(StatusCode::NO_CONTENT)
}
