//! Stack proposal against dependency manifest

use serde_json::{json, Value};
use specflow_core::{ArtifactRole, ArtifactSet};
use std::collections::BTreeSet;

use super::{CheckOutcome, CheckResult};
use crate::error::EvaluationError;

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Categories named in a stack proposal
///
/// `- Category: choice` bullets take precedence; without any, every
/// second-or-deeper level heading is a category.
pub fn stack_categories(content: &str) -> Vec<String> {
    let mut bullets = Vec::new();
    let mut headings = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("* ")) {
            if let Some((category, choice)) = rest.split_once(':') {
                let category = category.trim().trim_matches('*').trim();
                if !category.is_empty() && !choice.trim().is_empty() {
                    bullets.push(category.to_string());
                }
            }
        } else if trimmed.starts_with("##") {
            let heading = trimmed.trim_start_matches('#').trim();
            if !heading.is_empty() {
                headings.push(heading.to_string());
            }
        }
    }

    let mut seen = BTreeSet::new();
    let chosen = if bullets.is_empty() { headings } else { bullets };
    chosen
        .into_iter()
        .filter(|c| seen.insert(normalize(c)))
        .collect()
}

/// Every object key plus every `category` string value, normalized
fn manifest_categories(value: &Value, out: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                out.insert(normalize(key));
                if key == "category" {
                    if let Some(s) = child.as_str() {
                        out.insert(normalize(s));
                    }
                }
                manifest_categories(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                manifest_categories(item, out);
            }
        }
        _ => {}
    }
}

/// Every stack category must appear in the dependency manifest
pub fn check_dependencies(artifacts: &ArtifactSet) -> CheckResult {
    let Some(proposal) = artifacts.role_content(ArtifactRole::StackProposal) else {
        return Ok(CheckOutcome::pass("No stack proposal; nothing to cross-check"));
    };
    let proposal_name = artifacts
        .role(ArtifactRole::StackProposal)
        .map(|(name, _)| name)
        .unwrap_or_default();

    let categories = stack_categories(proposal);
    if categories.is_empty() {
        return Ok(
            CheckOutcome::pass("Stack proposal names no categories").with_artifacts([proposal_name]),
        );
    }

    let (manifest_name, manifest) = match (
        artifacts.role(ArtifactRole::DependencyManifest),
        artifacts.role_content(ArtifactRole::DependencyManifest),
    ) {
        (Some((name, _)), Some(content)) => (name, content),
        _ => {
            return Err(EvaluationError::MissingArtifact {
                role: "dependency manifest",
            })
        }
    };

    let doc: Value =
        serde_json::from_str(manifest).map_err(|e| EvaluationError::MalformedArtifact {
            name: manifest_name.to_string(),
            reason: e.to_string(),
        })?;
    let mut present = BTreeSet::new();
    manifest_categories(&doc, &mut present);

    let missing: Vec<String> = categories
        .iter()
        .filter(|c| !present.contains(&normalize(c)))
        .cloned()
        .collect();

    let details = json!({ "categories": categories, "missing": missing });
    let outcome = if missing.is_empty() {
        CheckOutcome::pass(format!(
            "All {} stack categories are present in the dependency manifest",
            categories.len()
        ))
    } else {
        CheckOutcome::fail(format!(
            "Stack categories missing from the dependency manifest: {}",
            missing.join(", ")
        ))
    };

    Ok(outcome
        .with_details(details)
        .with_artifacts([proposal_name, manifest_name]))
}
