//! API error mapping

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use specflow_core::{OrchestrationError, StoreError};
use specflow_validation::ValidationError;
use thiserror::Error;

use crate::handler::{ApiResponse, ErrorInfo};
use crate::telemetry::TelemetryError;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    InvalidState(String),
    AlreadyFinal,
    Conflict(String),
    InternalError(String),
}

impl ApiError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InvalidState(_) => "INVALID_STATE",
            ApiError::AlreadyFinal => "ALREADY_FINAL",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidState(_) | ApiError::AlreadyFinal | ApiError::Conflict(_) => {
                StatusCode::CONFLICT
            }
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::AlreadyFinal => "Project is already in the final phase".to_string(),
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::InvalidState(msg)
            | ApiError::Conflict(msg)
            | ApiError::InternalError(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self.message(), "Request failed");
        }
        let error_info = ErrorInfo::new(self.error_code(), self.message());
        let response = ApiResponse::<()>::error(error_info, uuid::Uuid::new_v4().to_string());
        (status, Json(response)).into_response()
    }
}

fn from_store(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound { .. } => ApiError::NotFound(err.to_string()),
        StoreError::Conflict(msg) => ApiError::Conflict(msg),
        other => ApiError::InternalError(other.to_string()),
    }
}

impl From<OrchestrationError> for ApiError {
    fn from(err: OrchestrationError) -> Self {
        match err {
            OrchestrationError::NotFound(_) => ApiError::NotFound(err.to_string()),
            OrchestrationError::InvalidState(msg) => ApiError::InvalidState(msg),
            OrchestrationError::AlreadyFinal => ApiError::AlreadyFinal,
            OrchestrationError::ConflictingRun(_) => ApiError::Conflict(err.to_string()),
            OrchestrationError::Store(store) => from_store(store),
            OrchestrationError::Unavailable(_) => ApiError::InternalError(err.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::RuleConflict(_) => ApiError::Conflict(err.to_string()),
            ValidationError::RuleNotFound(_) | ValidationError::ProjectNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            ValidationError::Store(store) => from_store(store),
            ValidationError::StatusWriteBack { .. } => ApiError::InternalError(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<TelemetryError> for ApiError {
    fn from(err: TelemetryError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

/// Failures while assembling the service
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Failed to initialize validation engine: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}
