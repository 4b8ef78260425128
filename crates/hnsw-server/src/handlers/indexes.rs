//! Index lifecycle: list, create, get, delete (spec §6).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use hnsw_core::{Distance, HnswEngine, IndexParameters};
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::{AppState, IndexEntry};
use crate::types::{CreateIndexRequest, IndexResponse, ListIndexesResponse};

fn to_response(name: &str, entry: &IndexEntry) -> IndexResponse {
    let params = entry.engine.parameters();
    IndexResponse {
        name: name.to_string(),
        dimension: entry.engine.dimension(),
        backing: entry.backing.clone(),
        distance: params.distance.name().to_string(),
        m: params.m,
        m_max: params.m_max,
        m_max0: params.m_max0,
        ef_construction: params.ef_construction,
        count: entry.engine.len(),
    }
}

pub async fn list_indexes(State(state): State<Arc<AppState>>) -> Json<ListIndexesResponse> {
    let indexes = state
        .list()
        .iter()
        .map(|(name, entry)| to_response(name, entry))
        .collect();
    Json(ListIndexesResponse { indexes })
}

pub async fn create_index(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateIndexRequest>,
) -> Result<(StatusCode, Json<IndexResponse>), ApiError> {
    if req.name.is_empty() {
        return Err(ApiError::InvalidArgument("index name must not be empty".into()));
    }
    if state.contains(&req.name) {
        return Err(ApiError::Conflict(format!("index {:?} already exists", req.name)));
    }

    let distance = Distance::from_name(&req.distance)
        .ok_or_else(|| ApiError::InvalidArgument(format!("unknown distance: {}", req.distance)))?;

    let m = req.m.unwrap_or(16);
    let mut params = IndexParameters::auto(m);
    params.distance = distance;
    if let Some(m_max) = req.m_max {
        params.m_max = m_max;
        params.m_max0 = m_max * 2;
    }
    if let Some(ef_construction) = req.ef_construction {
        params.ef_construction = ef_construction;
    }

    let engine = match req.backing.as_str() {
        "memory" => HnswEngine::in_memory(req.dimension, params),
        "durable" => {
            let path = state.durable_path(&req.name);
            HnswEngine::open_durable(path, req.dimension, params)
        }
        other => {
            return Err(ApiError::InvalidArgument(format!(
                "unknown backing: {other} (expected \"memory\" or \"durable\")"
            )))
        }
    }
    .map_err(ApiError::from)?;

    let entry = IndexEntry { engine: Arc::new(engine), backing: req.backing.clone() };
    let response = to_response(&req.name, &entry);
    if !state.insert(req.name.clone(), entry) {
        return Err(ApiError::Conflict(format!("index {:?} already exists", req.name)));
    }

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_index(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<IndexResponse>, ApiError> {
    let entry = state
        .get(&name)
        .ok_or_else(|| ApiError::NotFound(format!("index {name:?} not found")))?;
    Ok(Json(to_response(&name, &entry)))
}

pub async fn delete_index(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.remove(&name) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("index {name:?} not found")))
    }
}
