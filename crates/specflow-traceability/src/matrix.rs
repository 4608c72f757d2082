//! Requirement-to-artifact traceability matrix

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use specflow_core::text::{MIN_ENTITY_TOKEN, MIN_TASK_TOKEN};
use specflow_core::{ArtifactRole, ArtifactSet};
use std::collections::BTreeSet;
use std::fmt;

use crate::extract::{
    extract_endpoints, extract_entities, extract_requirements, extract_tasks, ApiEndpoint,
    DataEntity, Requirement, RequirementCategory, TaskItem,
};

/// Per-signal weights: coverage contributed by each match, capped at 100
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageWeights {
    pub api: f64,
    pub data: f64,
    pub tasks: f64,
}

impl Default for CoverageWeights {
    fn default() -> Self {
        Self {
            api: 30.0,
            data: 40.0,
            tasks: 30.0,
        }
    }
}

/// How completely a requirement is traced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageStatus {
    Covered,
    Partial,
    Uncovered,
}

impl CoverageStatus {
    pub fn from_coverage(coverage: f64) -> Self {
        if coverage >= 100.0 {
            CoverageStatus::Covered
        } else if coverage >= 50.0 {
            CoverageStatus::Partial
        } else {
            CoverageStatus::Uncovered
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageStatus::Covered => "covered",
            CoverageStatus::Partial => "partial",
            CoverageStatus::Uncovered => "uncovered",
        }
    }
}

impl fmt::Display for CoverageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementTrace {
    pub requirement_id: String,
    pub title: String,
    pub category: RequirementCategory,
    /// `METHOD /path` labels
    pub api_endpoints: Vec<String>,
    pub data_entities: Vec<String>,
    pub tasks: Vec<String>,
    pub coverage: f64,
    pub status: CoverageStatus,
}

impl RequirementTrace {
    pub fn has_api(&self) -> bool {
        !self.api_endpoints.is_empty()
    }

    pub fn has_data(&self) -> bool {
        !self.data_entities.is_empty()
    }

    pub fn has_tasks(&self) -> bool {
        !self.tasks.is_empty()
    }
}

/// Coverage matrix for one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceabilityMatrix {
    pub project_id: String,
    pub requirements: Vec<RequirementTrace>,
    pub total_requirements: usize,
    pub covered_count: usize,
    pub partial_count: usize,
    pub uncovered_count: usize,
    pub overall_coverage: f64,
    /// Signals found in the artifacts, matched or not
    pub total_endpoints: usize,
    pub total_entities: usize,
    pub total_tasks: usize,
    pub generated_at: DateTime<Utc>,
}

/// Coverage from the per-signal match counts
pub fn score(api: usize, data: usize, tasks: usize, weights: &CoverageWeights) -> f64 {
    let mut total = 0.0;
    let mut present = 0u32;
    for (count, weight) in [(api, weights.api), (data, weights.data), (tasks, weights.tasks)] {
        if count > 0 {
            total += (count as f64 * weight).min(100.0);
            present += 1;
        }
    }
    if present == 0 {
        0.0
    } else {
        total / f64::from(present)
    }
}

pub(crate) struct Signals {
    pub endpoints: Vec<ApiEndpoint>,
    pub entities: Vec<DataEntity>,
    pub tasks: Vec<TaskItem>,
}

impl Signals {
    pub fn from_artifacts(artifacts: &ArtifactSet) -> Self {
        Self {
            endpoints: artifacts
                .role_content(ArtifactRole::ApiSpec)
                .map(extract_endpoints)
                .unwrap_or_default(),
            entities: artifacts
                .role_content(ArtifactRole::DataModel)
                .map(extract_entities)
                .unwrap_or_default(),
            tasks: artifacts
                .role_content(ArtifactRole::Tasks)
                .map(extract_tasks)
                .unwrap_or_default(),
        }
    }

    pub fn trace(&self, requirement: &Requirement, weights: &CoverageWeights) -> RequirementTrace {
        let entity_tokens: BTreeSet<String> = requirement.tokens(MIN_ENTITY_TOKEN);
        let task_tokens: BTreeSet<String> = requirement.tokens(MIN_TASK_TOKEN);

        let api_endpoints: Vec<String> = self
            .endpoints
            .iter()
            .filter(|e| !e.tokens().is_disjoint(&entity_tokens))
            .map(ApiEndpoint::label)
            .collect();
        let data_entities: Vec<String> = self
            .entities
            .iter()
            .filter(|e| !e.tokens().is_disjoint(&entity_tokens))
            .map(|e| e.name.clone())
            .collect();
        let tasks: Vec<String> = self
            .tasks
            .iter()
            .filter(|t| !t.tokens().is_disjoint(&task_tokens))
            .map(|t| t.text.clone())
            .collect();

        let coverage = score(api_endpoints.len(), data_entities.len(), tasks.len(), weights);

        RequirementTrace {
            requirement_id: requirement.id.clone(),
            title: requirement.title.clone(),
            category: requirement.category,
            api_endpoints,
            data_entities,
            tasks,
            coverage,
            status: CoverageStatus::from_coverage(coverage),
        }
    }
}

impl TraceabilityMatrix {
    pub(crate) fn build(
        project_id: &str,
        artifacts: &ArtifactSet,
        weights: &CoverageWeights,
    ) -> Self {
        let requirements = artifacts
            .role_content(ArtifactRole::Requirements)
            .map(extract_requirements)
            .unwrap_or_default();
        let signals = Signals::from_artifacts(artifacts);

        let traces: Vec<RequirementTrace> = requirements
            .iter()
            .map(|r| signals.trace(r, weights))
            .collect();

        let count = |status: CoverageStatus| traces.iter().filter(|t| t.status == status).count();
        let overall_coverage = if traces.is_empty() {
            0.0
        } else {
            traces.iter().map(|t| t.coverage).sum::<f64>() / traces.len() as f64
        };

        Self {
            project_id: project_id.to_string(),
            total_requirements: traces.len(),
            covered_count: count(CoverageStatus::Covered),
            partial_count: count(CoverageStatus::Partial),
            uncovered_count: count(CoverageStatus::Uncovered),
            overall_coverage,
            total_endpoints: signals.endpoints.len(),
            total_entities: signals.entities.len(),
            total_tasks: signals.tasks.len(),
            requirements: traces,
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_caps_each_signal() {
        let w = CoverageWeights::default();
        assert_eq!(score(0, 0, 0, &w), 0.0);
        assert_eq!(score(1, 0, 0, &w), 30.0);
        assert_eq!(score(4, 0, 0, &w), 100.0);
        assert_eq!(score(1, 1, 1, &w), (30.0 + 40.0 + 30.0) / 3.0);
        assert_eq!(score(4, 3, 4, &w), 100.0);
    }

    #[test]
    fn test_status_thresholds() {
        assert_eq!(CoverageStatus::from_coverage(100.0), CoverageStatus::Covered);
        assert_eq!(CoverageStatus::from_coverage(99.9), CoverageStatus::Partial);
        assert_eq!(CoverageStatus::from_coverage(50.0), CoverageStatus::Partial);
        assert_eq!(CoverageStatus::from_coverage(49.9), CoverageStatus::Uncovered);
    }

    #[test]
    fn test_trace_collects_all_matches() {
        let artifacts = ArtifactSet::new()
            .with("requirements.md", "REQ-API-001: User profile endpoint\n")
            .with(
                "api_spec.json",
                r#"{"paths":{"/api/user/profile":{"get":{"summary":"Fetch profile"},"put":{"summary":"Update profile"}},"/api/orders":{"get":{}}}}"#,
            );
        let matrix = TraceabilityMatrix::build("p", &artifacts, &CoverageWeights::default());
        let row = &matrix.requirements[0];
        assert_eq!(row.api_endpoints.len(), 2);
        assert_eq!(row.coverage, 60.0);
        assert_eq!(row.status, CoverageStatus::Partial);
        assert_eq!(matrix.total_endpoints, 3);
    }
}
