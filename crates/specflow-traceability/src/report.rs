//! Coverage report: per-signal coverage, impact analysis and recommendations

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::matrix::{CoverageStatus, RequirementTrace, TraceabilityMatrix};

/// Coverage targets used for recommendations
pub const TARGET_COVERAGE: f64 = 80.0;
pub const CRITICAL_COVERAGE: f64 = 60.0;

/// Kind of artifact evidence a requirement can be traced to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    Api,
    Data,
    Tasks,
}

impl SignalType {
    pub const ALL: [SignalType; 3] = [SignalType::Api, SignalType::Data, SignalType::Tasks];

    fn present_in(self, trace: &RequirementTrace) -> bool {
        match self {
            SignalType::Api => trace.has_api(),
            SignalType::Data => trace.has_data(),
            SignalType::Tasks => trace.has_tasks(),
        }
    }

    fn label(self) -> &'static str {
        match self {
            SignalType::Api => "API",
            SignalType::Data => "Data model",
            SignalType::Tasks => "Task",
        }
    }

    fn remedy(self) -> &'static str {
        match self {
            SignalType::Api => "document endpoints",
            SignalType::Data => "model entities",
            SignalType::Tasks => "plan tasks",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignalType::Api => "api",
            SignalType::Data => "data",
            SignalType::Tasks => "tasks",
        })
    }
}

/// Risk of leaving a requirement as traced
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_missing(missing: usize) -> Self {
        if missing >= SignalType::ALL.len() {
            RiskLevel::High
        } else if missing >= 2 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Share of requirements (percent) with at least one match per signal type
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalCoverage {
    pub api: f64,
    pub data: f64,
    pub tasks: f64,
}

impl SignalCoverage {
    fn from_traces(traces: &[RequirementTrace]) -> Self {
        if traces.is_empty() {
            return Self::default();
        }
        let share = |signal: SignalType| {
            let hits = traces.iter().filter(|t| signal.present_in(t)).count();
            100.0 * hits as f64 / traces.len() as f64
        };
        Self {
            api: share(SignalType::Api),
            data: share(SignalType::Data),
            tasks: share(SignalType::Tasks),
        }
    }

    pub fn get(&self, signal: SignalType) -> f64 {
        match signal {
            SignalType::Api => self.api,
            SignalType::Data => self.data,
            SignalType::Tasks => self.tasks,
        }
    }
}

/// Impact entry for a partial or uncovered requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactItem {
    pub requirement_id: String,
    pub title: String,
    pub status: CoverageStatus,
    pub coverage: f64,
    pub missing_signals: Vec<SignalType>,
    pub risk: RiskLevel,
}

impl ImpactItem {
    fn from_trace(trace: &RequirementTrace) -> Self {
        let missing_signals: Vec<SignalType> = SignalType::ALL
            .into_iter()
            .filter(|s| !s.present_in(trace))
            .collect();
        Self {
            requirement_id: trace.requirement_id.clone(),
            title: trace.title.clone(),
            status: trace.status,
            coverage: trace.coverage,
            risk: RiskLevel::from_missing(missing_signals.len()),
            missing_signals,
        }
    }
}

/// Matrix plus analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    pub matrix: TraceabilityMatrix,
    pub signal_coverage: SignalCoverage,
    pub impact_analysis: Vec<ImpactItem>,
    pub recommendations: Vec<String>,
}

impl CoverageReport {
    pub fn from_matrix(matrix: TraceabilityMatrix) -> Self {
        let signal_coverage = SignalCoverage::from_traces(&matrix.requirements);

        let mut impact_analysis: Vec<ImpactItem> = matrix
            .requirements
            .iter()
            .filter(|t| t.status != CoverageStatus::Covered)
            .map(ImpactItem::from_trace)
            .collect();
        impact_analysis.sort_by(|a, b| b.risk.cmp(&a.risk));

        let recommendations = recommendations(&matrix, &signal_coverage);

        Self {
            matrix,
            signal_coverage,
            impact_analysis,
            recommendations,
        }
    }

    pub fn high_risk_count(&self) -> usize {
        self.impact_analysis
            .iter()
            .filter(|i| i.risk == RiskLevel::High)
            .count()
    }
}

fn recommendations(matrix: &TraceabilityMatrix, signals: &SignalCoverage) -> Vec<String> {
    if matrix.requirements.is_empty() {
        return vec![
            "No requirements found: add REQ-<CATEGORY>-<NNN> entries to the requirements document"
                .to_string(),
        ];
    }

    let mut out = Vec::new();
    let overall = matrix.overall_coverage;

    if overall < CRITICAL_COVERAGE {
        out.push(format!(
            "Critical: overall coverage is {overall:.1}%. Hold approval until the {} uncovered requirement(s) are traced to endpoints, entities and tasks",
            matrix.uncovered_count
        ));
    } else if overall < TARGET_COVERAGE {
        out.push(format!(
            "Refine artifacts: overall coverage is {overall:.1}%, below the {TARGET_COVERAGE:.0}% target; review the {} partially covered requirement(s)",
            matrix.partial_count
        ));
    }

    for signal in SignalType::ALL {
        let share = signals.get(signal);
        if share >= TARGET_COVERAGE {
            continue;
        }
        let missing: Vec<&str> = matrix
            .requirements
            .iter()
            .filter(|t| !signal.present_in(t))
            .map(|t| t.requirement_id.as_str())
            .collect();
        out.push(format!(
            "{} coverage is {share:.1}%: {} for {}",
            signal.label(),
            signal.remedy(),
            missing.join(", ")
        ));
    }

    if out.is_empty() {
        out.push(format!(
            "Coverage meets the {TARGET_COVERAGE:.0}% target; no remediation required"
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::RequirementCategory;
    use chrono::Utc;

    fn trace(id: &str, api: usize, data: usize, tasks: usize) -> RequirementTrace {
        let coverage = crate::matrix::score(api, data, tasks, &Default::default());
        RequirementTrace {
            requirement_id: id.to_string(),
            title: "t".to_string(),
            category: RequirementCategory::General,
            api_endpoints: vec!["GET /x".to_string(); api],
            data_entities: vec!["X".to_string(); data],
            tasks: vec!["do x".to_string(); tasks],
            coverage,
            status: CoverageStatus::from_coverage(coverage),
        }
    }

    fn matrix(traces: Vec<RequirementTrace>) -> TraceabilityMatrix {
        let count = |s: CoverageStatus| traces.iter().filter(|t| t.status == s).count();
        let overall = if traces.is_empty() {
            0.0
        } else {
            traces.iter().map(|t| t.coverage).sum::<f64>() / traces.len() as f64
        };
        TraceabilityMatrix {
            project_id: "p".to_string(),
            total_requirements: traces.len(),
            covered_count: count(CoverageStatus::Covered),
            partial_count: count(CoverageStatus::Partial),
            uncovered_count: count(CoverageStatus::Uncovered),
            overall_coverage: overall,
            total_endpoints: 0,
            total_entities: 0,
            total_tasks: 0,
            requirements: traces,
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_risk_levels() {
        assert_eq!(RiskLevel::from_missing(3), RiskLevel::High);
        assert_eq!(RiskLevel::from_missing(2), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_missing(1), RiskLevel::Low);
    }

    #[test]
    fn test_impact_skips_covered_and_orders_by_risk() {
        let report = CoverageReport::from_matrix(matrix(vec![
            trace("REQ-A-1", 4, 3, 4),
            trace("REQ-A-2", 0, 2, 0),
            trace("REQ-A-3", 0, 0, 0),
        ]));
        let ids: Vec<_> = report
            .impact_analysis
            .iter()
            .map(|i| i.requirement_id.as_str())
            .collect();
        assert_eq!(ids, vec!["REQ-A-3", "REQ-A-2"]);
        assert_eq!(report.impact_analysis[0].risk, RiskLevel::High);
        assert_eq!(
            report.impact_analysis[1].missing_signals,
            vec![SignalType::Api, SignalType::Tasks]
        );
        assert_eq!(report.high_risk_count(), 1);
    }

    #[test]
    fn test_signal_coverage_shares() {
        let report = CoverageReport::from_matrix(matrix(vec![
            trace("REQ-A-1", 1, 0, 1),
            trace("REQ-A-2", 0, 1, 1),
        ]));
        assert_eq!(report.signal_coverage.api, 50.0);
        assert_eq!(report.signal_coverage.data, 50.0);
        assert_eq!(report.signal_coverage.tasks, 100.0);
    }

    #[test]
    fn test_recommendations_thresholds() {
        let critical = CoverageReport::from_matrix(matrix(vec![trace("REQ-A-1", 1, 0, 0)]));
        assert!(critical.recommendations[0].starts_with("Critical"));

        // 70% overall: one refinement note plus weak-signal notes
        let refine = CoverageReport::from_matrix(matrix(vec![
            trace("REQ-A-1", 4, 3, 4),
            trace("REQ-A-2", 0, 1, 0),
        ]));
        assert!(refine.recommendations[0].starts_with("Refine"));
        assert!(refine.recommendations.iter().any(|r| r.contains("REQ-A-2")));

        let good = CoverageReport::from_matrix(matrix(vec![trace("REQ-A-1", 4, 3, 4)]));
        assert_eq!(good.recommendations.len(), 1);
        assert!(good.recommendations[0].contains("no remediation"));
    }

    #[test]
    fn test_empty_matrix_recommendation() {
        let report = CoverageReport::from_matrix(matrix(vec![]));
        assert!(report.impact_analysis.is_empty());
        assert_eq!(report.signal_coverage, SignalCoverage::default());
        assert!(report.recommendations[0].starts_with("No requirements"));
    }
}
