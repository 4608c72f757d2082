//! Data model for projects, artifacts, phase history and validation reports
//!
//! All types serialize with camelCase field names and snake_case/lowercase
//! enum values so they can be returned on the REST surface unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ParseEnumError;

/// One stage in the fixed delivery sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Analysis,
    StackSelection,
    Spec,
    Dependencies,
    Solutioning,
    /// Terminal phase
    Done,
}

impl Phase {
    /// The fixed phase order
    pub const SEQUENCE: [Phase; 6] = [
        Phase::Analysis,
        Phase::StackSelection,
        Phase::Spec,
        Phase::Dependencies,
        Phase::Solutioning,
        Phase::Done,
    ];

    /// Position in [`Phase::SEQUENCE`]
    pub fn index(self) -> usize {
        match self {
            Phase::Analysis => 0,
            Phase::StackSelection => 1,
            Phase::Spec => 2,
            Phase::Dependencies => 3,
            Phase::Solutioning => 4,
            Phase::Done => 5,
        }
    }

    /// The phase that follows this one, `None` at the terminal phase
    pub fn next(self) -> Option<Phase> {
        Phase::SEQUENCE.get(self.index() + 1).copied()
    }

    pub fn is_terminal(self) -> bool {
        self == Phase::Done
    }

    /// Whether finishing this phase's synthesis requires a human approval
    pub fn is_gated(self) -> bool {
        matches!(self, Phase::StackSelection | Phase::Dependencies)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Analysis => "analysis",
            Phase::StackSelection => "stack_selection",
            Phase::Spec => "spec",
            Phase::Dependencies => "dependencies",
            Phase::Solutioning => "solutioning",
            Phase::Done => "done",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::SEQUENCE
            .iter()
            .copied()
            .find(|p| p.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| ParseEnumError::new("phase", s))
    }
}

/// Severity of a validation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational - never affects the overall status
    Info,
    /// Warning - downgrades the overall status to warning
    Warning,
    /// Error - fails the report
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            _ => Err(ParseEnumError::new("severity", s)),
        }
    }
}

/// Category of a validation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    RequirementApi,
    RequirementData,
    RequirementTask,
    StackDependency,
}

impl RuleType {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleType::RequirementApi => "requirement_api",
            RuleType::RequirementData => "requirement_data",
            RuleType::RequirementTask => "requirement_task",
            RuleType::StackDependency => "stack_dependency",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall verdict of a validation report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pass,
    Warning,
    Fail,
}

impl ReportStatus {
    /// Derive the verdict from a set of results: fail if any error-severity
    /// result failed, else warning if any warning-severity result failed,
    /// else pass.
    pub fn derive(results: &[ValidationResult]) -> Self {
        let failed = |severity: Severity| {
            results
                .iter()
                .any(|r| !r.passed && r.severity == severity)
        };

        if failed(Severity::Error) {
            ReportStatus::Fail
        } else if failed(Severity::Warning) {
            ReportStatus::Warning
        } else {
            ReportStatus::Pass
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Pass => "pass",
            ReportStatus::Warning => "warning",
            ReportStatus::Fail => "fail",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation status of a stored artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactStatus {
    #[default]
    Pending,
    Pass,
    Warn,
    Fail,
}

/// A project moving through the delivery phases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub idea: String,
    pub current_phase: Phase,
    /// Exited phases in order; never contains `current_phase`
    pub phases_completed: Vec<Phase>,
    pub stack_approved: bool,
    pub dependencies_approved: bool,
    /// Snapshot of the orchestration run, written by the project actor
    pub orchestration_state: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a project in the first phase
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        idea: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            slug: slugify(&name),
            name,
            description: description.into(),
            idea: idea.into(),
            current_phase: Phase::Analysis,
            phases_completed: Vec::new(),
            stack_approved: false,
            dependencies_approved: false,
            orchestration_state: serde_json::Value::Null,
            created_at: now,
            updated_at: now,
        }
    }

    /// Use a caller-supplied id instead of a generated one
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Whether the approval flag for a gated phase is set
    pub fn is_approved(&self, phase: Phase) -> bool {
        match phase {
            Phase::StackSelection => self.stack_approved,
            Phase::Dependencies => self.dependencies_approved,
            _ => true,
        }
    }
}

/// Lowercase, alphanumeric runs joined by `-`
pub fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// Append-only audit entry, one per phase transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseHistoryEntry {
    pub project_id: String,
    pub from_phase: Option<Phase>,
    pub to_phase: Phase,
    pub artifacts_generated: Vec<String>,
    pub validation_passed: bool,
    pub timestamp: DateTime<Utc>,
}

/// A named document produced during a phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: Uuid,
    pub project_id: String,
    pub phase: Phase,
    pub artifact_name: String,
    pub agent_label: String,
    /// Assigned by the store: 1 + earlier artifacts with the same name
    pub version: u32,
    pub validation_status: ArtifactStatus,
    pub quality_score: Option<u8>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(
        project_id: impl Into<String>,
        phase: Phase,
        artifact_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id: project_id.into(),
            phase,
            artifact_name: artifact_name.into(),
            agent_label: String::new(),
            version: 0,
            validation_status: ArtifactStatus::Pending,
            quality_score: None,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn with_agent(mut self, agent_label: impl Into<String>) -> Self {
        self.agent_label = agent_label.into();
        self
    }

    pub fn with_quality(mut self, score: u8) -> Self {
        self.quality_score = Some(score.min(100));
        self
    }

    pub fn with_status(mut self, status: ArtifactStatus) -> Self {
        self.validation_status = status;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Outcome of one rule inside a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub rule_id: String,
    pub rule_name: String,
    pub passed: bool,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_artifacts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_requirements: Option<Vec<String>>,
}

impl ValidationResult {
    pub fn passed(
        rule_id: impl Into<String>,
        rule_name: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            rule_name: rule_name.into(),
            passed: true,
            severity,
            message: message.into(),
            details: None,
            affected_artifacts: None,
            affected_requirements: None,
        }
    }

    pub fn failed(
        rule_id: impl Into<String>,
        rule_name: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            passed: false,
            ..Self::passed(rule_id, rule_name, severity, message)
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_artifacts(mut self, artifacts: Vec<String>) -> Self {
        self.affected_artifacts = Some(artifacts);
        self
    }

    pub fn with_requirements(mut self, requirements: Vec<String>) -> Self {
        self.affected_requirements = Some(requirements);
        self
    }
}

/// Metadata recorded with every report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub validated_at: DateTime<Utc>,
    pub artifacts_validated: Vec<String>,
    /// SHA-256 over the validated (name, content) pairs
    pub inputs_hash: String,
}

/// Immutable verdict of one validation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub id: Uuid,
    pub project_id: String,
    pub phase: Phase,
    pub report_name: String,
    pub overall_status: ReportStatus,
    pub total_rules: usize,
    pub passed_rules: usize,
    pub failed_rules: usize,
    pub warning_rules: usize,
    pub validation_results: Vec<ValidationResult>,
    pub report_metadata: ReportMetadata,
}

impl ValidationReport {
    /// Build a report from evaluated results. Counts and the overall status
    /// are derived here and nowhere else.
    pub fn from_results(
        project_id: impl Into<String>,
        phase: Phase,
        results: Vec<ValidationResult>,
        metadata: ReportMetadata,
    ) -> Self {
        let passed_rules = results.iter().filter(|r| r.passed).count();
        let failed_rules = results
            .iter()
            .filter(|r| !r.passed && r.severity == Severity::Error)
            .count();
        let warning_rules = results
            .iter()
            .filter(|r| !r.passed && r.severity == Severity::Warning)
            .count();

        Self {
            id: Uuid::new_v4(),
            project_id: project_id.into(),
            phase,
            report_name: format!(
                "{} validation {}",
                phase,
                metadata.validated_at.format("%Y-%m-%d %H:%M:%S")
            ),
            overall_status: ReportStatus::derive(&results),
            total_rules: results.len(),
            passed_rules,
            failed_rules,
            warning_rules,
            validation_results: results,
            report_metadata: metadata,
        }
    }

    /// Failing results only
    pub fn failures(&self) -> impl Iterator<Item = &ValidationResult> {
        self.validation_results.iter().filter(|r| !r.passed)
    }
}

/// Durable, versioned status of a project's synthesis run. Written only by
/// the project's actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub project_id: String,
    /// Bumped by the store on every write
    pub version: u64,
    /// Generation counter; stale step completions carry an older id
    pub run_id: u64,
    pub is_running: bool,
    /// Index of the next plan step in the current phase
    pub next_step: usize,
    pub current_agent_label: Option<String>,
    pub awaiting_approval: bool,
    pub last_error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl RunRecord {
    pub fn new(project_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            project_id: project_id.into(),
            version: 0,
            run_id: 0,
            is_running: false,
            next_step: 0,
            current_agent_label: None,
            awaiting_approval: false,
            last_error: None,
            started_at: None,
            updated_at: now,
        }
    }

    /// Clear per-phase bookkeeping after a transition
    pub fn reset_for_phase(&mut self) {
        self.next_step = 0;
        self.current_agent_label = None;
        self.awaiting_approval = false;
    }
}
