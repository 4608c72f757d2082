//! Integration tests for Specflow Traceability
//!
//! Exercises the engine over whole artifact sets and checks the coverage
//! invariants with generated documents.

use proptest::prelude::*;
use specflow_core::ArtifactSet;
use specflow_traceability::{
    score, CoverageStatus, CoverageWeights, RiskLevel, TraceabilityEngine,
};

const API_SPEC: &str = r#"{
  "openapi": "3.0.0",
  "paths": {
    "/api/users": {"get": {"summary": "List user accounts"}},
    "/api/users/{id}/profile": {"put": {"summary": "Update user profile"}},
    "/api/invoices": {"post": {"summary": "Create invoice"}}
  }
}"#;

const DATA_MODEL: &str = "# Data Model\n\n## User Table\n- id\n\n## UserProfile Table\n- bio\n\n## Invoice Entity\n- total\n";

const TASKS: &str = "# Tasks\n- [ ] Implement user registration\n- [x] Build profile editor\n1. Generate invoice documents\n";

#[test]
fn test_data_headings_match_store_requirements() {
    let artifacts = ArtifactSet::new()
        .with(
            "requirements.md",
            "- REQ-DATA-001: Store user information\n- REQ-DATA-002: Store user profile data\n",
        )
        .with("data_model.md", DATA_MODEL);

    let matrix = TraceabilityEngine::new().generate_traceability_matrix("p1", &artifacts);
    assert_eq!(matrix.total_requirements, 2);
    for row in &matrix.requirements {
        assert!(row.data_entities.contains(&"User".to_string()), "{row:?}");
        assert!(row.data_entities.contains(&"UserProfile".to_string()), "{row:?}");
        assert!(row.coverage >= 40.0);
    }
}

#[test]
fn test_empty_artifacts_have_zero_coverage() {
    let engine = TraceabilityEngine::new();
    let matrix = engine.generate_traceability_matrix("p1", &ArtifactSet::new());
    assert_eq!(matrix.total_requirements, 0);
    assert_eq!(matrix.overall_coverage, 0.0);

    let report = engine.generate_coverage_report("p1", &ArtifactSet::new());
    assert!(report.impact_analysis.is_empty());
    assert_eq!(report.recommendations.len(), 1);
}

#[test]
fn test_full_artifact_set() {
    let artifacts = ArtifactSet::new()
        .with(
            "requirements.md",
            "REQ-AUTH-001: User registration\nREQ-DATA-001: Invoice records\nREQ-GEN-001: Weekly newsletter\n",
        )
        .with("api_spec.json", API_SPEC)
        .with("data_model.md", DATA_MODEL)
        .with("tasks.md", TASKS);

    let report = TraceabilityEngine::new().generate_coverage_report("p1", &artifacts);
    let matrix = &report.matrix;
    assert_eq!(matrix.total_endpoints, 3);
    assert_eq!(matrix.total_entities, 3);
    assert_eq!(matrix.total_tasks, 3);

    let user = &matrix.requirements[0];
    assert_eq!(user.api_endpoints.len(), 2);
    assert_eq!(user.data_entities.len(), 2);
    assert_eq!(user.tasks, vec!["Implement user registration".to_string()]);
    assert_eq!(user.coverage, (60.0 + 80.0 + 30.0) / 3.0);

    let newsletter = &matrix.requirements[2];
    assert_eq!(newsletter.status, CoverageStatus::Uncovered);
    assert_eq!(newsletter.coverage, 0.0);

    let impact = report
        .impact_analysis
        .iter()
        .find(|i| i.requirement_id == "REQ-GEN-001")
        .unwrap();
    assert_eq!(impact.risk, RiskLevel::High);
    assert_eq!(report.impact_analysis[0].risk, RiskLevel::High);
}

#[test]
fn test_malformed_api_spec_contributes_nothing() {
    let artifacts = ArtifactSet::new()
        .with("requirements.md", "REQ-API-001: User authentication endpoint\n")
        .with("api_spec.json", "{ not json");
    let matrix = TraceabilityEngine::new().generate_traceability_matrix("p1", &artifacts);
    assert_eq!(matrix.total_endpoints, 0);
    assert_eq!(matrix.requirements[0].status, CoverageStatus::Uncovered);
}

const WORDS: &[&str] = &[
    "user", "profile", "invoice", "order", "payment", "report", "search", "account", "email",
    "session",
];

fn title() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(WORDS), 1..4).prop_map(|w| w.join(" "))
}

fn artifact_set() -> impl Strategy<Value = ArtifactSet> {
    (
        prop::collection::vec(title(), 0..8),
        prop::collection::vec(title(), 0..5),
        prop::collection::vec(title(), 0..5),
        prop::collection::vec(title(), 0..5),
    )
        .prop_map(|(reqs, paths, tables, tasks)| {
            let requirements: String = reqs
                .iter()
                .enumerate()
                .map(|(i, t)| format!("REQ-GEN-{i:03}: {t}\n"))
                .collect();
            let endpoints: Vec<serde_json::Value> = paths
                .iter()
                .map(|t| serde_json::json!({"method": "GET", "path": format!("/api/{}", t.replace(' ', "/"))}))
                .collect();
            let data_model: String = tables.iter().map(|t| format!("## {t} Table\n")).collect();
            let task_list: String = tasks.iter().map(|t| format!("- [ ] {t}\n")).collect();

            ArtifactSet::new()
                .with("requirements.md", requirements)
                .with("api_spec.json", serde_json::json!({ "endpoints": endpoints }).to_string())
                .with("data_model.md", data_model)
                .with("tasks.md", task_list)
        })
}

proptest! {
    #[test]
    fn prop_score_bounded_and_status_consistent(api in 0usize..6, data in 0usize..6, tasks in 0usize..6) {
        let coverage = score(api, data, tasks, &CoverageWeights::default());
        prop_assert!((0.0..=100.0).contains(&coverage));

        let status = CoverageStatus::from_coverage(coverage);
        prop_assert_eq!(status == CoverageStatus::Covered, coverage == 100.0);
        prop_assert_eq!(status == CoverageStatus::Uncovered, coverage < 50.0);
    }

    #[test]
    fn prop_matrix_aggregates_are_consistent(artifacts in artifact_set()) {
        let matrix = TraceabilityEngine::new().generate_traceability_matrix("p", &artifacts);

        prop_assert_eq!(matrix.total_requirements, matrix.requirements.len());
        prop_assert_eq!(
            matrix.covered_count + matrix.partial_count + matrix.uncovered_count,
            matrix.total_requirements
        );

        for row in &matrix.requirements {
            prop_assert!((0.0..=100.0).contains(&row.coverage));
            prop_assert_eq!(row.status, CoverageStatus::from_coverage(row.coverage));
        }

        if matrix.requirements.is_empty() {
            prop_assert_eq!(matrix.overall_coverage, 0.0);
        } else {
            let mean = matrix.requirements.iter().map(|r| r.coverage).sum::<f64>()
                / matrix.requirements.len() as f64;
            prop_assert!((matrix.overall_coverage - mean).abs() < 1e-9);
        }
    }
}
