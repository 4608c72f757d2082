//! Validation error types

use specflow_core::StoreError;
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the validation engine and service
///
/// Bad artifact content is never an error here; it becomes a failing result.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Rule already exists: {0}")]
    RuleConflict(String),

    #[error("Rule not found: {0}")]
    RuleNotFound(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The report was saved but artifact statuses are stale
    #[error("Report {report_id} saved, but {failed} artifact status update(s) failed: {source}")]
    StatusWriteBack {
        report_id: Uuid,
        failed: usize,
        #[source]
        source: StoreError,
    },
}

impl ValidationError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::RuleConflict(_) => "CONFLICT",
            ValidationError::RuleNotFound(_) | ValidationError::ProjectNotFound(_) => "NOT_FOUND",
            ValidationError::Store(StoreError::NotFound { .. }) => "NOT_FOUND",
            ValidationError::Store(_) | ValidationError::StatusWriteBack { .. } => "STORE_ERROR",
        }
    }
}

/// Result type alias for validation operations
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Why a rule's evaluator could not produce a verdict
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("Required {role} artifact is missing")]
    MissingArtifact { role: &'static str },

    #[error("Artifact {name} is malformed: {reason}")]
    MalformedArtifact { name: String, reason: String },
}

impl EvaluationError {
    pub fn kind(&self) -> &'static str {
        match self {
            EvaluationError::MissingArtifact { .. } => "missing_artifact",
            EvaluationError::MalformedArtifact { .. } => "malformed_artifact",
        }
    }
}
