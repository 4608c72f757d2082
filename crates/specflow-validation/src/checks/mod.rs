//! Rule evaluators
//!
//! Every [`RuleCheck`] variant maps to exactly one evaluator function here.
//! Evaluators return a [`CheckOutcome`] or an [`EvaluationError`]; the
//! dispatcher folds both into a [`ValidationResult`] so a broken artifact
//! only fails the rule that needed it.

pub mod requirements;
pub mod stack;

use serde_json::json;
use specflow_core::{ArtifactSet, RuleCheck, ValidationResult, ValidationRule};

use crate::error::EvaluationError;

/// Verdict of a single evaluator
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub passed: bool,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub affected_artifacts: Vec<String>,
    pub affected_requirements: Vec<String>,
}

impl CheckOutcome {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: None,
            affected_artifacts: Vec::new(),
            affected_requirements: Vec::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            ..Self::pass(message)
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_artifacts<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.affected_artifacts = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_requirements(mut self, ids: Vec<String>) -> Self {
        self.affected_requirements = ids;
        self
    }
}

pub type CheckResult = std::result::Result<CheckOutcome, EvaluationError>;

/// Run one rule against an artifact set
pub fn evaluate(rule: &ValidationRule, artifacts: &ArtifactSet) -> ValidationResult {
    let outcome = match &rule.evaluator {
        RuleCheck::RequirementApi { requirement_prefix } => {
            requirements::check_api(requirement_prefix, artifacts)
        }
        RuleCheck::RequirementData { requirement_prefix } => {
            requirements::check_data(requirement_prefix, artifacts)
        }
        RuleCheck::RequirementTask { requirement_prefix } => {
            requirements::check_tasks(requirement_prefix, artifacts)
        }
        RuleCheck::StackDependency => stack::check_dependencies(artifacts),
    };

    match outcome {
        Ok(outcome) => {
            let mut result = if outcome.passed {
                ValidationResult::passed(&rule.id, &rule.name, rule.severity, outcome.message)
            } else {
                ValidationResult::failed(&rule.id, &rule.name, rule.severity, outcome.message)
            };
            if let Some(details) = outcome.details {
                result = result.with_details(details);
            }
            if !outcome.affected_artifacts.is_empty() {
                result = result.with_artifacts(outcome.affected_artifacts);
            }
            if !outcome.affected_requirements.is_empty() {
                result = result.with_requirements(outcome.affected_requirements);
            }
            result
        }
        Err(err) => {
            tracing::debug!(rule_id = %rule.id, error = %err, "Rule evaluation failed");
            let mut result = ValidationResult::failed(
                &rule.id,
                &rule.name,
                rule.severity,
                format!("Evaluation failed: {err}"),
            )
            .with_details(json!({ "evaluationError": err.kind() }));
            if let EvaluationError::MalformedArtifact { name, .. } = &err {
                result = result.with_artifacts(vec![name.clone()]);
            }
            result
        }
    }
}
