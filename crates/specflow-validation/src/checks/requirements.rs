//! Requirement-to-artifact overlap checks

use serde_json::json;
use specflow_core::text::{MIN_ENTITY_TOKEN, MIN_TASK_TOKEN};
use specflow_core::{ArtifactRole, ArtifactSet};
use specflow_traceability::{
    extract_entities, extract_requirements, extract_tasks, parse_api_spec, Requirement,
};
use std::collections::BTreeSet;

use super::{CheckOutcome, CheckResult};
use crate::error::EvaluationError;

/// Requirements with `prefix`, or `None` when there is no requirements document
fn source_requirements<'a>(
    artifacts: &'a ArtifactSet,
    prefix: &str,
) -> Option<(&'a str, Vec<Requirement>)> {
    let (name, _) = artifacts.role(ArtifactRole::Requirements)?;
    let content = artifacts.role_content(ArtifactRole::Requirements)?;
    let requirements = extract_requirements(content)
        .into_iter()
        .filter(|r| r.has_prefix(prefix))
        .collect();
    Some((name, requirements))
}

fn target<'a>(
    artifacts: &'a ArtifactSet,
    role: ArtifactRole,
    label: &'static str,
) -> Result<(&'a str, &'a str), EvaluationError> {
    match (artifacts.role(role), artifacts.role_content(role)) {
        (Some((name, _)), Some(content)) => Ok((name, content)),
        _ => Err(EvaluationError::MissingArtifact { role: label }),
    }
}

/// Shared shape of the three checks: every requirement must overlap at
/// least one target token set
fn overlap_check(
    prefix: &str,
    source_name: &str,
    requirements: &[Requirement],
    target_name: &str,
    targets: &[BTreeSet<String>],
    min_len: usize,
    noun: &str,
) -> CheckOutcome {
    let unmatched: Vec<String> = requirements
        .iter()
        .filter(|r| {
            let tokens = r.tokens(min_len);
            !targets.iter().any(|t| !t.is_disjoint(&tokens))
        })
        .map(|r| r.id.clone())
        .collect();

    let details = json!({
        "requirementsChecked": requirements.len(),
        "targetsChecked": targets.len(),
        "unmatched": unmatched,
    });

    if unmatched.is_empty() {
        CheckOutcome::pass(format!(
            "All {} {prefix}* requirements map to {noun}",
            requirements.len()
        ))
        .with_details(details)
        .with_artifacts([source_name, target_name])
    } else {
        CheckOutcome::fail(format!(
            "{} of {} {prefix}* requirements have no matching {noun}: {}",
            unmatched.len(),
            requirements.len(),
            unmatched.join(", ")
        ))
        .with_details(details)
        .with_artifacts([source_name, target_name])
        .with_requirements(unmatched)
    }
}

fn vacuous(prefix: &str, source: Option<&str>) -> CheckOutcome {
    match source {
        None => CheckOutcome::pass("No requirements document; nothing to cross-check"),
        Some(name) => CheckOutcome::pass(format!("No {prefix}* requirements to cross-check"))
            .with_artifacts([name]),
    }
}

/// Each requirement must overlap an API path, summary or description
pub fn check_api(prefix: &str, artifacts: &ArtifactSet) -> CheckResult {
    let (source, requirements) = match source_requirements(artifacts, prefix) {
        Some((name, reqs)) if !reqs.is_empty() => (name, reqs),
        other => return Ok(vacuous(prefix, other.map(|(name, _)| name))),
    };

    let (name, content) = target(artifacts, ArtifactRole::ApiSpec, "API specification")?;
    let endpoints = parse_api_spec(content).map_err(|e| EvaluationError::MalformedArtifact {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    let targets: Vec<_> = endpoints.iter().map(|e| e.tokens()).collect();

    Ok(overlap_check(
        prefix,
        source,
        &requirements,
        name,
        &targets,
        MIN_ENTITY_TOKEN,
        "API endpoints",
    ))
}

/// Each requirement must overlap a data-model entity heading
pub fn check_data(prefix: &str, artifacts: &ArtifactSet) -> CheckResult {
    let (source, requirements) = match source_requirements(artifacts, prefix) {
        Some((name, reqs)) if !reqs.is_empty() => (name, reqs),
        other => return Ok(vacuous(prefix, other.map(|(name, _)| name))),
    };

    let (name, content) = target(artifacts, ArtifactRole::DataModel, "data model")?;
    let targets: Vec<_> = extract_entities(content).iter().map(|e| e.tokens()).collect();

    Ok(overlap_check(
        prefix,
        source,
        &requirements,
        name,
        &targets,
        MIN_ENTITY_TOKEN,
        "data entities",
    ))
}

/// Each requirement title must share a topic keyword with the task breakdown
pub fn check_tasks(prefix: &str, artifacts: &ArtifactSet) -> CheckResult {
    let (source, requirements) = match source_requirements(artifacts, prefix) {
        Some((name, reqs)) if !reqs.is_empty() => (name, reqs),
        other => return Ok(vacuous(prefix, other.map(|(name, _)| name))),
    };

    let (name, content) = target(artifacts, ArtifactRole::Tasks, "task breakdown")?;
    let targets: Vec<_> = extract_tasks(content).iter().map(|t| t.tokens()).collect();

    Ok(overlap_check(
        prefix,
        source,
        &requirements,
        name,
        &targets,
        MIN_TASK_TOKEN,
        "tasks",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: &str = r#"{"paths":{"/api/auth":{"post":{"summary":"User authentication"}}}}"#;

    #[test]
    fn test_api_overlap_passes() {
        let artifacts = ArtifactSet::new()
            .with("requirements.md", "REQ-API-001: User authentication endpoint")
            .with("api_spec.json", SPEC);
        let outcome = check_api("REQ-API-", &artifacts).unwrap();
        assert!(outcome.passed, "{}", outcome.message);
    }

    #[test]
    fn test_api_overlap_fails_with_affected_requirement() {
        let artifacts = ArtifactSet::new()
            .with(
                "requirements.md",
                "REQ-API-001: Very specific requirement without matching endpoint",
            )
            .with("api_spec.json", r#"{"paths":{"/api/other":{"get":{}}}}"#);
        let outcome = check_api("REQ-API-", &artifacts).unwrap();
        assert!(!outcome.passed);
        assert_eq!(outcome.affected_requirements, vec!["REQ-API-001".to_string()]);
        assert_eq!(
            outcome.affected_artifacts,
            vec!["requirements.md".to_string(), "api_spec.json".to_string()]
        );
    }

    #[test]
    fn test_only_prefixed_requirements_are_checked() {
        let artifacts = ArtifactSet::new()
            .with("requirements.md", "REQ-UI-001: Colourful dashboard widgets")
            .with("api_spec.json", SPEC);
        let outcome = check_api("REQ-API-", &artifacts).unwrap();
        assert!(outcome.passed);
    }

    #[test]
    fn test_absent_source_passes_vacuously() {
        let artifacts = ArtifactSet::new().with("api_spec.json", "not even json");
        assert!(check_api("REQ-API-", &artifacts).unwrap().passed);
        assert!(check_data("REQ-DATA-", &ArtifactSet::new()).unwrap().passed);
        assert!(check_tasks("REQ-", &ArtifactSet::new()).unwrap().passed);
    }

    #[test]
    fn test_missing_target_is_an_evaluation_error() {
        let artifacts = ArtifactSet::new().with("requirements.md", "REQ-API-001: Login");
        assert_eq!(
            check_api("REQ-API-", &artifacts).unwrap_err(),
            EvaluationError::MissingArtifact {
                role: "API specification"
            }
        );
    }

    #[test]
    fn test_data_entities() {
        let artifacts = ArtifactSet::new()
            .with(
                "requirements.md",
                "REQ-DATA-001: Store user information\nREQ-DATA-002: Archive shipping labels",
            )
            .with("data_model.md", "## User Table\n## UserProfile Table\n");
        let outcome = check_data("REQ-DATA-", &artifacts).unwrap();
        assert!(!outcome.passed);
        assert_eq!(outcome.affected_requirements, vec!["REQ-DATA-002".to_string()]);
    }

    #[test]
    fn test_task_topics() {
        let artifacts = ArtifactSet::new()
            .with(
                "requirements.md",
                "REQ-AUTH-001: User login\nREQ-API-001: Invoice export endpoint",
            )
            .with("tasks.md", "- [ ] Build user login form\n- [ ] Implement invoice export\n");
        assert!(check_tasks("REQ-", &artifacts).unwrap().passed);
    }
}
