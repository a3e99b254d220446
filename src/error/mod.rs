use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation failed: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("Assessment is already {status}")]
    AlreadyFinished { status: String },

    #[error("AI gateway error: {0}")]
    Upstream(#[from] GatewayError),

    #[error("Storage error: {0}")]
    Persistence(StorageError),
}

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection failed: {message}")]
    Connection { message: String },

    #[error("Assessment not found: {assessment_id}")]
    AssessmentNotFound { assessment_id: String },

    #[error("Migration failed: {message}")]
    Migration { message: String },

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// AI gateway errors
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("AI backend unavailable: {message} (retries: {retries})")]
    Unavailable { message: String, retries: u32 },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AppError {
    /// Shorthand for a not-found assessment
    pub fn assessment_not_found(id: impl Into<String>) -> Self {
        AppError::NotFound {
            resource: "Assessment",
            id: id.into(),
        }
    }

    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::AlreadyFinished { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Config { .. } | AppError::Upstream(_) | AppError::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to callers.
    ///
    /// Upstream failures get a generic message; the internal detail is
    /// logged but never echoed back.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Upstream(GatewayError::Unavailable { .. })
            | AppError::Upstream(GatewayError::Timeout { .. }) => {
                "AI service is temporarily unavailable. Please try again in a moment.".to_string()
            }
            AppError::Upstream(_) => "Error processing your request. Please try again.".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "success": false,
            "data": serde_json::Value::Null,
            "error": self.user_message(),
        }));

        (status, body).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::AssessmentNotFound { assessment_id } => {
                AppError::assessment_not_found(assessment_id)
            }
            other => AppError::Persistence(other),
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
