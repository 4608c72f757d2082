//! Specflow Traceability
//!
//! Scores how well each requirement is traced into the downstream artifacts
//! (API description, data model, task breakdown). The engine is stateless and
//! total: it never fails on bad input, it simply finds fewer signals.

pub mod extract;
pub mod matrix;
pub mod report;

pub use extract::{
    extract_endpoints, extract_entities, extract_requirements, extract_tasks, parse_api_spec,
    ApiEndpoint, DataEntity, Requirement, RequirementCategory, TaskItem,
};
pub use matrix::{score, CoverageStatus, CoverageWeights, RequirementTrace, TraceabilityMatrix};
pub use report::{CoverageReport, ImpactItem, RiskLevel, SignalCoverage, SignalType};

use specflow_core::ArtifactSet;
use tracing::debug;

/// Computes traceability matrices and coverage reports
#[derive(Debug, Clone, Default)]
pub struct TraceabilityEngine {
    weights: CoverageWeights,
}

impl TraceabilityEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: CoverageWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &CoverageWeights {
        &self.weights
    }

    /// Recompute the full matrix for a project's artifacts
    pub fn generate_traceability_matrix(
        &self,
        project_id: &str,
        artifacts: &ArtifactSet,
    ) -> TraceabilityMatrix {
        let matrix = TraceabilityMatrix::build(project_id, artifacts, &self.weights);
        debug!(
            project_id = %project_id,
            requirements = matrix.total_requirements,
            covered = matrix.covered_count,
            partial = matrix.partial_count,
            uncovered = matrix.uncovered_count,
            overall_coverage = matrix.overall_coverage,
            "Traceability matrix generated"
        );
        matrix
    }

    /// Matrix plus per-signal coverage, impact analysis and recommendations
    pub fn generate_coverage_report(
        &self,
        project_id: &str,
        artifacts: &ArtifactSet,
    ) -> CoverageReport {
        CoverageReport::from_matrix(self.generate_traceability_matrix(project_id, artifacts))
    }
}
