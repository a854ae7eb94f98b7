use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::{db::StoreError, ingest::IngestError};

/// HTTP-facing failure: bad input is the caller's to fix, an unavailable
/// store is retryable. Cache trouble never surfaces here — it is swallowed
/// below this boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    StoreUnavailable(String),
}

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::InvalidInput(msg) => Self::InvalidInput(msg),
            IngestError::StoreUnavailable(e) => Self::StoreUnavailable(e.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::StoreUnavailable(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_maps_to_422() {
        let resp = ApiError::InvalidInput("bad".into()).into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn store_unavailable_maps_to_503() {
        let resp = ApiError::StoreUnavailable("down".into()).into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn ingest_errors_convert_by_kind() {
        let api: ApiError = IngestError::InvalidInput("x".into()).into();
        assert!(matches!(api, ApiError::InvalidInput(_)));

        let api: ApiError =
            IngestError::StoreUnavailable(StoreError::Timeout(std::time::Duration::from_secs(5)))
                .into();
        assert!(matches!(api, ApiError::StoreUnavailable(_)));
    }
}
