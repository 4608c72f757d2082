//! Built-in rule set

use specflow_core::{RuleCheck, Severity, ValidationRule};

pub const REQ_API_RULE: &str = "REQ-API-001";
pub const REQ_DATA_RULE: &str = "REQ-DATA-001";
pub const REQ_TASK_RULE: &str = "REQ-TASK-001";
pub const STACK_DEP_RULE: &str = "STACK-DEP-001";

/// Rules registered when the store holds none
pub fn default_rules() -> Vec<ValidationRule> {
    vec![
        ValidationRule::new(
            REQ_API_RULE,
            "API requirements traced to endpoints",
            Severity::Error,
            RuleCheck::RequirementApi {
                requirement_prefix: "REQ-API-".to_string(),
            },
        )
        .with_description(
            "Every REQ-API-* requirement must share a keyword with an API path, summary or description",
        ),
        ValidationRule::new(
            REQ_DATA_RULE,
            "Data requirements traced to entities",
            Severity::Warning,
            RuleCheck::RequirementData {
                requirement_prefix: "REQ-DATA-".to_string(),
            },
        )
        .with_description(
            "Every REQ-DATA-* requirement must share a keyword with a data model table, entity or schema heading",
        ),
        ValidationRule::new(
            REQ_TASK_RULE,
            "Requirements reflected in the task plan",
            Severity::Info,
            RuleCheck::RequirementTask {
                requirement_prefix: "REQ-".to_string(),
            },
        )
        .with_description("Every requirement title must share a topic keyword with the task breakdown"),
        ValidationRule::new(
            STACK_DEP_RULE,
            "Stack categories present in dependency manifest",
            Severity::Warning,
            RuleCheck::StackDependency,
        )
        .with_description(
            "Every category named in the stack proposal must appear in the dependency manifest",
        ),
    ]
}
