//! Store-of-record interfaces
//!
//! The relational store is an external collaborator; these traits are the
//! slice of it the orchestrator and the engines consume. Implementations must
//! give read-your-writes consistency so `progress()` reflects just-completed
//! transitions.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{
    Artifact, ArtifactStatus, PhaseHistoryEntry, Project, RunRecord, ValidationReport,
};
use crate::rules::ValidationRule;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Projects and their append-only phase history
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Insert a new project; fails with `Conflict` if the id exists
    async fn insert_project(&self, project: Project) -> StoreResult<()>;

    async fn get_project(&self, id: &str) -> StoreResult<Option<Project>>;

    /// Replace an existing project; fails with `NotFound` if absent
    async fn update_project(&self, project: Project) -> StoreResult<()>;

    async fn append_history(&self, entry: PhaseHistoryEntry) -> StoreResult<()>;

    /// History entries in append order
    async fn phase_history(&self, project_id: &str) -> StoreResult<Vec<PhaseHistoryEntry>>;
}

/// Synthesized artifacts
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist an artifact, assigning its version. Returns the stored row.
    async fn insert_artifact(&self, artifact: Artifact) -> StoreResult<Artifact>;

    /// All artifacts of a project in creation order
    async fn list_artifacts(&self, project_id: &str) -> StoreResult<Vec<Artifact>>;

    /// Validation write-back
    async fn set_validation_status(&self, artifact_id: Uuid, status: ArtifactStatus)
        -> StoreResult<()>;
}

/// Versioned run records
#[async_trait]
pub trait RunStore: Send + Sync {
    async fn get_run(&self, project_id: &str) -> StoreResult<Option<RunRecord>>;

    /// Write a run record if the stored version equals `expected_version`
    /// (0 when no record exists yet). Returns the record with its new version.
    async fn put_run(&self, record: RunRecord, expected_version: u64) -> StoreResult<RunRecord>;
}

/// Validation reports and the rule registry
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn save_report(&self, report: ValidationReport) -> StoreResult<()>;

    async fn get_report(&self, id: Uuid) -> StoreResult<Option<ValidationReport>>;

    /// Reports of a project, newest first, at most `limit`
    async fn list_reports(&self, project_id: &str, limit: usize)
        -> StoreResult<Vec<ValidationReport>>;

    /// Insert or replace a rule definition by id
    async fn save_rule(&self, rule: ValidationRule) -> StoreResult<()>;

    /// Rule definitions in registration order
    async fn list_rules(&self) -> StoreResult<Vec<ValidationRule>>;
}

/// Handles to each store interface. All four usually point at the same
/// backend; tests substitute individual ones.
#[derive(Clone)]
pub struct StoreHandles {
    pub projects: Arc<dyn ProjectStore>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub runs: Arc<dyn RunStore>,
    pub reports: Arc<dyn ReportStore>,
}

impl StoreHandles {
    /// Route every interface to one backend
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: ProjectStore + ArtifactStore + RunStore + ReportStore + 'static,
    {
        Self {
            projects: backend.clone(),
            artifacts: backend.clone(),
            runs: backend.clone(),
            reports: backend,
        }
    }

    /// Fresh in-memory backend
    pub fn memory() -> Self {
        Self::from_backend(Arc::new(MemoryStore::new()))
    }

    pub fn with_artifacts(mut self, artifacts: Arc<dyn ArtifactStore>) -> Self {
        self.artifacts = artifacts;
        self
    }
}

impl std::fmt::Debug for StoreHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandles").finish_non_exhaustive()
    }
}
