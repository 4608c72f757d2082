//! Validation rule definitions
//!
//! A rule is data: identity, severity, an enabled flag and one closed
//! [`RuleCheck`] variant selecting the evaluator. The validation engine owns
//! the dispatcher; the report store persists the definitions.

use serde::{Deserialize, Serialize};

use crate::model::{RuleType, Severity};

/// The evaluator a rule runs. One case per rule type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleCheck {
    /// Requirements with the prefix must keyword-overlap an API endpoint
    RequirementApi {
        #[serde(default = "default_api_prefix")]
        requirement_prefix: String,
    },
    /// Requirements with the prefix must keyword-overlap a data entity
    RequirementData {
        #[serde(default = "default_data_prefix")]
        requirement_prefix: String,
    },
    /// Requirements with the prefix must share a topic with the task plan
    RequirementTask {
        #[serde(default = "default_any_prefix")]
        requirement_prefix: String,
    },
    /// Stack categories must be present in the dependency manifest
    StackDependency,
}

fn default_api_prefix() -> String {
    "REQ-API-".to_string()
}

fn default_data_prefix() -> String {
    "REQ-DATA-".to_string()
}

fn default_any_prefix() -> String {
    "REQ-".to_string()
}

impl RuleCheck {
    pub fn rule_type(&self) -> RuleType {
        match self {
            RuleCheck::RequirementApi { .. } => RuleType::RequirementApi,
            RuleCheck::RequirementData { .. } => RuleType::RequirementData,
            RuleCheck::RequirementTask { .. } => RuleType::RequirementTask,
            RuleCheck::StackDependency => RuleType::StackDependency,
        }
    }
}

/// A typed, severity-tagged check evaluated against the artifact set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    pub severity: Severity,
    pub enabled: bool,
    pub evaluator: RuleCheck,
}

impl ValidationRule {
    /// Create an enabled rule; the type follows the evaluator
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        severity: Severity,
        evaluator: RuleCheck,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            rule_type: evaluator.rule_type(),
            severity,
            enabled: true,
            evaluator,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_type_follows_evaluator() {
        let rule = ValidationRule::new("X", "x", Severity::Info, RuleCheck::StackDependency);
        assert_eq!(rule.rule_type, RuleType::StackDependency);
        assert!(rule.enabled);
    }

    #[test]
    fn test_rule_check_wire_format() {
        let check: RuleCheck =
            serde_json::from_value(serde_json::json!({"kind": "requirement_api"})).unwrap();
        assert_eq!(
            check,
            RuleCheck::RequirementApi {
                requirement_prefix: "REQ-API-".into()
            }
        );

        let rule = ValidationRule::new(
            "REQ-DATA-001",
            "Data coverage",
            Severity::Warning,
            RuleCheck::RequirementData {
                requirement_prefix: "REQ-DATA-".into(),
            },
        );
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["type"], "requirement_data");
        assert_eq!(json["evaluator"]["kind"], "requirement_data");
        assert_eq!(json["severity"], "warning");
    }
}
