//! Project-level validation: load artifacts, validate, write back statuses

use specflow_core::config::ValidationConfig;
use specflow_core::{
    latest_versions, Artifact, ArtifactSet, ArtifactStatus, Phase, Severity, StoreError,
    StoreHandles, ValidationReport,
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::dashboard::ValidationDashboard;
use crate::engine::ValidationEngine;
use crate::error::{Result, ValidationError};

/// Status an artifact earns from a report: `fail` when touched by a failing
/// error rule, `warn` when touched by a failing warning rule, else `pass`
pub fn artifact_status(report: &ValidationReport, artifact_name: &str) -> ArtifactStatus {
    let worst = report
        .failures()
        .filter(|r| {
            r.affected_artifacts
                .as_ref()
                .is_some_and(|names| names.iter().any(|n| n == artifact_name))
        })
        .map(|r| r.severity)
        .max();

    match worst {
        Some(Severity::Error) => ArtifactStatus::Fail,
        Some(Severity::Warning) => ArtifactStatus::Warn,
        _ => ArtifactStatus::Pass,
    }
}

/// Validation entry point used by the API and the orchestrator
#[derive(Debug, Clone)]
pub struct ValidationService {
    engine: Arc<ValidationEngine>,
    stores: StoreHandles,
    config: ValidationConfig,
}

impl ValidationService {
    pub fn new(engine: Arc<ValidationEngine>, stores: StoreHandles, config: ValidationConfig) -> Self {
        Self {
            engine,
            stores,
            config,
        }
    }

    pub fn engine(&self) -> &Arc<ValidationEngine> {
        &self.engine
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Latest artifact set of a project; fails if the project is unknown
    pub async fn load_artifacts(&self, project_id: &str) -> Result<(Vec<Artifact>, ArtifactSet)> {
        if self.stores.projects.get_project(project_id).await?.is_none() {
            return Err(ValidationError::ProjectNotFound(project_id.to_string()));
        }
        let stored = self.stores.artifacts.list_artifacts(project_id).await?;
        let set = ArtifactSet::from_artifacts(&stored);
        Ok((stored, set))
    }

    /// Validate the project's latest artifacts for `phase` and record each
    /// artifact's resulting status.
    ///
    /// The report is saved before the write-back; if any status update fails
    /// the call returns `StatusWriteBack` carrying the saved report's id.
    pub async fn validate_project(&self, project_id: &str, phase: Phase) -> Result<ValidationReport> {
        let (stored, set) = self.load_artifacts(project_id).await?;
        let report = self.engine.validate_artifacts(project_id, phase, &set).await?;

        let mut failed = 0;
        let mut first_error: Option<StoreError> = None;
        for artifact in latest_versions(&stored) {
            let status = artifact_status(&report, &artifact.artifact_name);
            if status == artifact.validation_status {
                continue;
            }
            match self
                .stores
                .artifacts
                .set_validation_status(artifact.id, status)
                .await
            {
                Ok(()) => {
                    debug!(artifact = %artifact.artifact_name, status = ?status, "Artifact status updated")
                }
                Err(e) => {
                    warn!(
                        project_id = %project_id,
                        artifact = %artifact.artifact_name,
                        error = %e,
                        "Failed to record artifact validation status"
                    );
                    failed += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(source) => Err(ValidationError::StatusWriteBack {
                report_id: report.id,
                failed,
                source,
            }),
            None => Ok(report),
        }
    }

    /// Reports newest first; `None` uses the configured default limit
    pub async fn history(&self, project_id: &str, limit: Option<usize>) -> Result<Vec<ValidationReport>> {
        let limit = limit.unwrap_or(self.config.default_history_limit);
        self.engine.get_validation_history(project_id, limit).await
    }

    /// Aggregated verdicts, rule statistics and recent reports
    pub async fn dashboard(&self, project_id: &str) -> Result<ValidationDashboard> {
        let (stored, _) = self.load_artifacts(project_id).await?;
        let reports = self
            .engine
            .get_validation_history(project_id, usize::MAX)
            .await?;
        let latest = latest_versions(&stored);
        Ok(ValidationDashboard::build(
            &reports,
            &latest,
            self.config.dashboard_recent_reports,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specflow_core::{ReportMetadata, ValidationResult};

    fn report(results: Vec<ValidationResult>) -> ValidationReport {
        ValidationReport::from_results(
            "p",
            Phase::Spec,
            results,
            ReportMetadata {
                validated_at: chrono::Utc::now(),
                artifacts_validated: vec![],
                inputs_hash: String::new(),
            },
        )
    }

    #[test]
    fn test_artifact_status_takes_worst_failure() {
        let report = report(vec![
            ValidationResult::failed("A", "a", Severity::Warning, "w")
                .with_artifacts(vec!["data_model.md".into(), "requirements.md".into()]),
            ValidationResult::failed("B", "b", Severity::Error, "e")
                .with_artifacts(vec!["api_spec.json".into(), "requirements.md".into()]),
            ValidationResult::failed("C", "c", Severity::Info, "i")
                .with_artifacts(vec!["tasks.md".into()]),
            ValidationResult::passed("D", "d", Severity::Error, "ok")
                .with_artifacts(vec!["dependencies.json".into()]),
        ]);

        assert_eq!(artifact_status(&report, "requirements.md"), ArtifactStatus::Fail);
        assert_eq!(artifact_status(&report, "data_model.md"), ArtifactStatus::Warn);
        assert_eq!(artifact_status(&report, "tasks.md"), ArtifactStatus::Pass);
        assert_eq!(artifact_status(&report, "dependencies.json"), ArtifactStatus::Pass);
    }
}
