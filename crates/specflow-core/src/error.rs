//! Error types shared across the Specflow crates
//!
//! Store failures, orchestration failures and enum parsing failures. The
//! validation and traceability engines never surface errors for bad artifact
//! content; they degrade to failing or empty results instead.

use thiserror::Error;

/// Errors raised by a store-of-record implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The addressed row does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Optimistic concurrency check failed on a versioned record
    #[error("Version conflict for {id}: expected {expected}, found {actual}")]
    VersionConflict {
        id: String,
        expected: u64,
        actual: u64,
    },

    /// Uniqueness violation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Backend unavailable or failed
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

/// Errors raised by orchestrator operations
#[derive(Error, Debug)]
pub enum OrchestrationError {
    /// Unknown project id
    #[error("Project not found: {0}")]
    NotFound(String),

    /// Operation not valid in the current phase or run state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Advance or start requested at the terminal phase
    #[error("Project is already in the final phase")]
    AlreadyFinal,

    /// The run record was written by someone else since it was last read.
    /// The stored record has been reloaded; retrying is safe.
    #[error("Run record for project {0} was changed concurrently; retry")]
    ConflictingRun(String),

    /// Store of record failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The project actor is gone (runtime shutting down)
    #[error("Orchestrator unavailable: {0}")]
    Unavailable(String),
}

impl OrchestrationError {
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        OrchestrationError::InvalidState(msg.into())
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            OrchestrationError::NotFound(_) => "NOT_FOUND",
            OrchestrationError::InvalidState(_) => "INVALID_STATE",
            OrchestrationError::AlreadyFinal => "ALREADY_FINAL",
            OrchestrationError::ConflictingRun(_) => "CONFLICTING_RUN",
            OrchestrationError::Store(StoreError::NotFound { .. }) => "NOT_FOUND",
            OrchestrationError::Store(_) => "STORE_ERROR",
            OrchestrationError::Unavailable(_) => "UNAVAILABLE",
        }
    }
}

/// Result type alias for orchestration operations
pub type Result<T> = std::result::Result<T, OrchestrationError>;

/// A wire enum value that is not part of the closed set
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}
