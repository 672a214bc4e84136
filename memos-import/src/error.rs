//! HTTP error type for memos-import
//!
//! Every handler error renders as `{"error": {"code", "message"}}`. Conflicts
//! also carry the id of the job holding the active slot.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::client::ClientError;
use crate::models::JobId;
use crate::services::{AdmitError, StagingError};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Request content failed validation (400)
    #[error("{0}")]
    Validation(String),

    /// Another job is running (409)
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        active_job_id: Option<JobId>,
    },

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal(_) | ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn job_conflict(active: JobId) -> Self {
        ApiError::Conflict {
            message: "A job is already running".to_string(),
            active_job_id: Some(active),
        }
    }
}

impl From<StagingError> for ApiError {
    fn from(err: StagingError) -> Self {
        if err.is_client_error() {
            ApiError::Validation(err.to_string())
        } else {
            error!(error = %err, "Upload staging failed");
            ApiError::Internal(err.to_string())
        }
    }
}

impl From<AdmitError> for ApiError {
    fn from(err: AdmitError) -> Self {
        match err {
            AdmitError::AlreadyRunning { active } => ApiError::job_conflict(active),
        }
    }
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        match &err {
            ClientError::InvalidEndpoint(_) => ApiError::BadRequest(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_code, message, active_job_id) = match self {
            ApiError::NotFound(msg) => ("NOT_FOUND", msg, None),
            ApiError::BadRequest(msg) => ("BAD_REQUEST", msg, None),
            ApiError::Validation(msg) => ("VALIDATION_ERROR", msg, None),
            ApiError::Conflict {
                message,
                active_job_id,
            } => ("CONFLICT", message, active_job_id),
            ApiError::Internal(msg) => ("INTERNAL_ERROR", msg, None),
            ApiError::Io(ref err) => ("IO_ERROR", err.to_string(), None),
        };

        let mut body = json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });
        if let Some(id) = active_job_id {
            body["activeJobId"] = json!(id);
        }

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
