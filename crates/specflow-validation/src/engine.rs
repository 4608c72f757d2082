//! Validation engine: rule registry plus runner
//!
//! The registry lives behind an async `RwLock` and is written through to the
//! report store, so rule changes survive engine restarts when the store does.
//! A run snapshots the enabled rules before evaluating; registry changes only
//! affect later runs.

use chrono::Utc;
use specflow_core::{
    ArtifactSet, Phase, ReportMetadata, ReportStore, ValidationReport, ValidationRule,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::checks;
use crate::defaults::default_rules;
use crate::error::{Result, ValidationError};

/// The cross-artifact validation engine
pub struct ValidationEngine {
    rules: RwLock<Vec<ValidationRule>>,
    reports: Arc<dyn ReportStore>,
}

impl std::fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationEngine").finish_non_exhaustive()
    }
}

impl ValidationEngine {
    /// Engine over an explicit rule set, nothing persisted yet
    pub fn with_rules(reports: Arc<dyn ReportStore>, rules: Vec<ValidationRule>) -> Self {
        Self {
            rules: RwLock::new(rules),
            reports,
        }
    }

    /// Load the registry from the store, seeding the default rules when it
    /// holds none
    pub async fn initialize(reports: Arc<dyn ReportStore>) -> Result<Self> {
        let mut rules = reports.list_rules().await?;
        if rules.is_empty() {
            rules = default_rules();
            for rule in &rules {
                reports.save_rule(rule.clone()).await?;
            }
            debug!(count = rules.len(), "Seeded default validation rules");
        }
        Ok(Self::with_rules(reports, rules))
    }

    /// Copy of the registry
    pub async fn get_rules(&self) -> Vec<ValidationRule> {
        self.rules.read().await.clone()
    }

    pub async fn get_rule(&self, rule_id: &str) -> Option<ValidationRule> {
        self.rules
            .read()
            .await
            .iter()
            .find(|r| r.id == rule_id)
            .cloned()
    }

    /// Register a new rule; ids are unique
    pub async fn add_rule(&self, rule: ValidationRule) -> Result<()> {
        let mut rules = self.rules.write().await;
        if rules.iter().any(|r| r.id == rule.id) {
            return Err(ValidationError::RuleConflict(rule.id));
        }
        self.reports.save_rule(rule.clone()).await?;
        info!(rule_id = %rule.id, rule_type = %rule.rule_type, "Validation rule added");
        rules.push(rule);
        Ok(())
    }

    /// Enable or disable a rule, returning its new definition
    pub async fn set_rule_enabled(&self, rule_id: &str, enabled: bool) -> Result<ValidationRule> {
        let mut rules = self.rules.write().await;
        let rule = rules
            .iter_mut()
            .find(|r| r.id == rule_id)
            .ok_or_else(|| ValidationError::RuleNotFound(rule_id.to_string()))?;

        let mut updated = rule.clone();
        updated.enabled = enabled;
        self.reports.save_rule(updated.clone()).await?;
        *rule = updated.clone();

        info!(rule_id = %rule_id, enabled, "Validation rule toggled");
        Ok(updated)
    }

    /// Evaluate every enabled rule and persist the resulting report
    #[instrument(skip(self, artifacts), fields(artifacts = artifacts.len()))]
    pub async fn validate_artifacts(
        &self,
        project_id: &str,
        phase: Phase,
        artifacts: &ArtifactSet,
    ) -> Result<ValidationReport> {
        let started = Instant::now();
        let enabled: Vec<ValidationRule> = self
            .rules
            .read()
            .await
            .iter()
            .filter(|r| r.enabled)
            .cloned()
            .collect();

        let results = enabled
            .iter()
            .map(|rule| checks::evaluate(rule, artifacts))
            .collect();

        let metadata = ReportMetadata {
            validated_at: Utc::now(),
            artifacts_validated: artifacts.names(),
            inputs_hash: artifacts.inputs_hash(),
        };
        let report = ValidationReport::from_results(project_id, phase, results, metadata);
        self.reports.save_report(report.clone()).await?;

        info!(
            project_id = %project_id,
            phase = %phase,
            report_id = %report.id,
            status = %report.overall_status,
            total = report.total_rules,
            passed = report.passed_rules,
            failed = report.failed_rules,
            warnings = report.warning_rules,
            duration_ms = started.elapsed().as_millis() as u64,
            "Validation completed"
        );
        Ok(report)
    }

    /// Reports of a project, newest first
    pub async fn get_validation_history(
        &self,
        project_id: &str,
        limit: usize,
    ) -> Result<Vec<ValidationReport>> {
        Ok(self.reports.list_reports(project_id, limit).await?)
    }

    /// A single report, `None` when unknown
    pub async fn get_validation_report(&self, report_id: Uuid) -> Result<Option<ValidationReport>> {
        Ok(self.reports.get_report(report_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{REQ_API_RULE, STACK_DEP_RULE};
    use specflow_core::{MemoryStore, ReportStatus, RuleCheck, Severity};

    async fn engine() -> (ValidationEngine, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let engine = ValidationEngine::initialize(store.clone()).await.unwrap();
        (engine, store)
    }

    #[tokio::test]
    async fn test_initialize_seeds_and_reloads() {
        let (engine, store) = engine().await;
        assert_eq!(engine.get_rules().await.len(), 4);
        assert_eq!(store.list_rules().await.unwrap().len(), 4);

        engine.set_rule_enabled(STACK_DEP_RULE, false).await.unwrap();
        let reloaded = ValidationEngine::initialize(store).await.unwrap();
        assert!(!reloaded.get_rule(STACK_DEP_RULE).await.unwrap().enabled);
    }

    #[tokio::test]
    async fn test_get_rules_is_a_copy() {
        let (engine, _) = engine().await;
        let mut copy = engine.get_rules().await;
        copy.clear();
        assert_eq!(engine.get_rules().await.len(), 4);
    }

    #[tokio::test]
    async fn test_add_rule_conflict() {
        let (engine, _) = engine().await;
        let duplicate = ValidationRule::new(
            REQ_API_RULE,
            "dup",
            Severity::Info,
            RuleCheck::StackDependency,
        );
        assert!(matches!(
            engine.add_rule(duplicate).await,
            Err(ValidationError::RuleConflict(id)) if id == REQ_API_RULE
        ));

        let extra = ValidationRule::new(
            "REQ-SEC-001",
            "Security requirements have tasks",
            Severity::Warning,
            RuleCheck::RequirementTask {
                requirement_prefix: "REQ-SEC-".into(),
            },
        );
        engine.add_rule(extra).await.unwrap();
        assert_eq!(engine.get_rules().await.len(), 5);
    }

    #[tokio::test]
    async fn test_set_rule_enabled_unknown() {
        let (engine, _) = engine().await;
        assert!(matches!(
            engine.set_rule_enabled("NOPE", false).await,
            Err(ValidationError::RuleNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_validate_persists_report() {
        let (engine, _) = engine().await;
        let artifacts = ArtifactSet::new().with("notes.md", "nothing to see");

        let report = engine
            .validate_artifacts("p1", Phase::Analysis, &artifacts)
            .await
            .unwrap();
        assert_eq!(report.total_rules, 4);
        assert_eq!(report.overall_status, ReportStatus::Pass);
        assert_eq!(report.report_metadata.artifacts_validated, vec!["notes.md"]);

        let fetched = engine.get_validation_report(report.id).await.unwrap();
        assert_eq!(fetched, Some(report));
        assert!(engine
            .get_validation_report(Uuid::new_v4())
            .await
            .unwrap()
            .is_none());
    }
}
