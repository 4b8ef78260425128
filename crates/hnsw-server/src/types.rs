//! Request/response DTOs for the HTTP gateway (spec §6).

use serde::{Deserialize, Serialize};

fn default_backing() -> String {
    "memory".to_string()
}

fn default_distance() -> String {
    "euclidean".to_string()
}

/// `POST /v1/indexes` body.
#[derive(Debug, Deserialize)]
pub struct CreateIndexRequest {
    pub name: String,
    pub dimension: usize,
    #[serde(default = "default_backing")]
    pub backing: String,
    #[serde(default = "default_distance")]
    pub distance: String,
    pub m: Option<usize>,
    pub m_max: Option<usize>,
    pub ef_construction: Option<usize>,
}

/// Shape returned by `GET`/`POST`/`list` on `/v1/indexes`.
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub name: String,
    pub dimension: usize,
    pub backing: String,
    pub distance: String,
    pub m: usize,
    pub m_max: usize,
    pub m_max0: usize,
    pub ef_construction: usize,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ListIndexesResponse {
    pub indexes: Vec<IndexResponse>,
}

/// `POST /v1/indexes/{name}/vectors` body (single).
#[derive(Debug, Deserialize)]
pub struct AddVectorRequest {
    pub id: String,
    pub vector: Vec<f32>,
}

/// `POST /v1/indexes/{name}/vectors/batch` body.
#[derive(Debug, Deserialize)]
pub struct AddVectorsBatchRequest {
    pub vectors: Vec<AddVectorRequest>,
}

/// `POST /v1/indexes/{name}/search` body.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: Vec<f32>,
    pub k: usize,
    pub ef: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResultDto {
    pub id: String,
    pub vector: Vec<f32>,
    pub distance: f32,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResultDto>,
}
