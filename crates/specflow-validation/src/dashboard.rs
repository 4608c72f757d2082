//! Validation dashboard aggregation

use serde::{Deserialize, Serialize};
use specflow_core::{Artifact, ReportStatus, ValidationReport};
use std::collections::BTreeMap;

/// Headline numbers over a project's reports
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_reports: usize,
    pub pass_count: usize,
    pub warning_count: usize,
    pub fail_count: usize,
    /// Percentage of reports that passed, 0 when there are none
    pub pass_rate: f64,
    pub latest_status: Option<ReportStatus>,
    /// Mean quality score of the latest artifacts that have one
    pub average_quality: Option<f64>,
}

/// Evaluation counts for one rule across all reports
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleStats {
    pub rule_name: String,
    pub evaluations: usize,
    pub failures: usize,
    pub failure_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDashboard {
    pub metrics: DashboardMetrics,
    pub rule_stats: BTreeMap<String, RuleStats>,
    pub recent_reports: Vec<ValidationReport>,
}

fn rate(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}

impl ValidationDashboard {
    /// `reports` must be newest first
    pub fn build(reports: &[ValidationReport], artifacts: &[&Artifact], recent: usize) -> Self {
        let count = |status: ReportStatus| {
            reports
                .iter()
                .filter(|r| r.overall_status == status)
                .count()
        };
        let pass_count = count(ReportStatus::Pass);

        let scores: Vec<f64> = artifacts
            .iter()
            .filter_map(|a| a.quality_score)
            .map(f64::from)
            .collect();
        let average_quality =
            (!scores.is_empty()).then(|| scores.iter().sum::<f64>() / scores.len() as f64);

        let metrics = DashboardMetrics {
            total_reports: reports.len(),
            pass_count,
            warning_count: count(ReportStatus::Warning),
            fail_count: count(ReportStatus::Fail),
            pass_rate: rate(pass_count, reports.len()),
            latest_status: reports.first().map(|r| r.overall_status),
            average_quality,
        };

        let mut rule_stats: BTreeMap<String, RuleStats> = BTreeMap::new();
        for result in reports.iter().flat_map(|r| &r.validation_results) {
            let stats = rule_stats.entry(result.rule_id.clone()).or_default();
            if stats.rule_name.is_empty() {
                stats.rule_name = result.rule_name.clone();
            }
            stats.evaluations += 1;
            if !result.passed {
                stats.failures += 1;
            }
        }
        for stats in rule_stats.values_mut() {
            stats.failure_rate = rate(stats.failures, stats.evaluations);
        }

        Self {
            metrics,
            rule_stats,
            recent_reports: reports.iter().take(recent).cloned().collect(),
        }
    }
}
