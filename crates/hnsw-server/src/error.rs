//! Maps [`hnsw_core::Error`] and gateway-local failures to HTTP
//! responses (spec §6 status-code table).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hnsw_core::{Error as CoreError, ErrorKind};
use serde::Serialize;

/// JSON body for every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Gateway-level errors: either a core engine error or a request-shape
/// problem the core never sees (missing index, bad index name).
pub enum ApiError {
    Core(CoreError),
    NotFound(String),
    Conflict(String),
    InvalidArgument(String),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Self::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Core(err) => {
                let status = match err.kind() {
                    ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
                    ErrorKind::Conflict => StatusCode::CONFLICT,
                    ErrorKind::Cancelled => StatusCode::BAD_REQUEST,
                    ErrorKind::Io | ErrorKind::CorruptionPossible => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, err.to_string())
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
