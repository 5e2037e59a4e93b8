//! HTTP error mapping.
//!
//! Every failure leaves the service as `{"error": {"code", "message"}}` with
//! the matching status code. Storage details are logged, not returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::db::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("storage failure: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn project_not_found(project_id: i64) -> Self {
        Self::NotFound(format!("Project {} not found", project_id))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Store(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::Store(e) => {
                tracing::error!(error = %e, "storage failure");
                "Internal server error".to_string()
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                msg.clone()
            }
            other => {
                tracing::debug!(status = %status, error = %other, "request rejected");
                other.to_string()
            }
        };

        (
            status,
            Json(json!({ "error": { "code": self.code(), "message": message } })),
        )
            .into_response()
    }
}

/// Run blocking storage work off the async executor.
pub async fn blocking<F, T, E>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| StoreError::Join(e.to_string()))?
        .map_err(Into::into)
}
