//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::AnalysisStatus;

pub type AppResult<T> = Result<T, AppError>;

/// Errors surfaced at the HTTP boundary
#[derive(Debug)]
pub enum AppError {
    // Request errors
    MissingFile,
    ValidationError(String),
    PayloadTooLarge,

    // Resource errors
    NotFound(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::MissingFile => (StatusCode::BAD_REQUEST, "No APK file uploaded"),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "APK exceeds the upload limit"),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Analysis failed")
            }
        };

        let body = Json(json!({
            "message": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => AppError::NotFound("Analysis not found".to_string()),
            other => AppError::InternalError(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(format!("Invalid upload: {}", err))
    }
}

/// Errors from the analysis store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("analysis {0} not found")]
    NotFound(u64),

    #[error("analysis {id}: illegal status change {from} -> {to}")]
    InvalidTransition {
        id: u64,
        from: AnalysisStatus,
        to: AnalysisStatus,
    },
}

/// Errors raised inside the detached analysis task. Never returned to a
/// client; the task turns them into a `failed` status.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("stage failed: {0}")]
    Stage(String),

    #[error("ledger unavailable: {0}")]
    Upstream(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_missing_file_is_400_with_message() {
        let (status, body) = body_json(AppError::MissingFile).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "No APK file uploaded");
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let (status, body) = body_json(AppError::InternalError("lock poisoned".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Analysis failed");
    }

    #[test]
    fn test_store_not_found_maps_to_404() {
        let err: AppError = StoreError::NotFound(3).into();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
