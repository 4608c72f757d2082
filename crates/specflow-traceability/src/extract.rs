//! Signal extraction from semi-structured artifacts
//!
//! Each extractor is total: malformed or unexpected input yields an empty
//! (or partial) result, never an error. Callers that need to distinguish
//! "absent" from "malformed" use [`parse_api_spec`] directly.

use regex::Regex;
use serde::{Deserialize, Serialize};
use specflow_core::text::{tokenize, MIN_ENTITY_TOKEN, MIN_TASK_TOKEN};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::OnceLock;

fn requirement_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(REQ-([A-Z]+)-\d+)\**\s*:\s*(.+)$").expect("requirement pattern is valid")
    })
}

fn entity_heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(table|entity|schema)\b").expect("entity pattern is valid")
    })
}

fn task_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:[-*+]\s*\[[ xX]\]|\d+[.)])\s+(.+?)\s*$").expect("task pattern is valid")
    })
}

const HTTP_METHODS: &[&str] = &["get", "post", "put", "patch", "delete", "head", "options"];

/// Requirement category, decided by keywords in the title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementCategory {
    Authentication,
    Data,
    Ui,
    Api,
    Security,
    General,
}

impl RequirementCategory {
    /// Categories tried in order; the first with a matching keyword wins
    const ORDERED: [(RequirementCategory, &'static [&'static str]); 5] = [
        (
            RequirementCategory::Authentication,
            &["auth", "login", "logout", "password", "credential", "session", "signin", "signup", "oauth"],
        ),
        (
            RequirementCategory::Data,
            &["data", "database", "store", "storage", "persist", "record", "table", "schema"],
        ),
        (
            RequirementCategory::Ui,
            &["ui", "page", "screen", "view", "display", "dashboard", "form", "button", "interface"],
        ),
        (
            RequirementCategory::Api,
            &["api", "endpoint", "rest", "route", "request", "response", "webhook"],
        ),
        (
            RequirementCategory::Security,
            &["security", "secure", "encrypt", "permission", "role", "audit", "compliance"],
        ),
    ];

    pub fn classify(title: &str) -> Self {
        let tokens = tokenize(title, 1);
        Self::ORDERED
            .iter()
            .find(|(_, keywords)| {
                tokens
                    .iter()
                    .any(|t| keywords.iter().any(|k| t.starts_with(k)))
            })
            .map(|(category, _)| *category)
            .unwrap_or(RequirementCategory::General)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementCategory::Authentication => "authentication",
            RequirementCategory::Data => "data",
            RequirementCategory::Ui => "ui",
            RequirementCategory::Api => "api",
            RequirementCategory::Security => "security",
            RequirementCategory::General => "general",
        }
    }
}

impl fmt::Display for RequirementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `REQ-<CODE>-<NNN>: title` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub id: String,
    /// The `<CODE>` segment of the id (`API`, `DATA`, ...)
    pub code: String,
    pub title: String,
    pub category: RequirementCategory,
}

impl Requirement {
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.id.starts_with(prefix)
    }

    pub fn tokens(&self, min_len: usize) -> BTreeSet<String> {
        tokenize(&self.title, min_len)
    }
}

/// Requirements in document order, first occurrence of each id
pub fn extract_requirements(content: &str) -> Vec<Requirement> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for line in content.lines() {
        let Some(caps) = requirement_re().captures(line) else {
            continue;
        };
        let id = caps[1].to_string();
        let title = caps[3].trim().trim_matches('*').trim().to_string();
        if title.is_empty() || !seen.insert(id.clone()) {
            continue;
        }
        out.push(Requirement {
            category: RequirementCategory::classify(&title),
            code: caps[2].to_string(),
            id,
            title,
        });
    }

    out
}

/// One operation of an API description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoint {
    pub method: String,
    pub path: String,
    pub summary: String,
    pub description: String,
}

impl ApiEndpoint {
    /// `METHOD /path`
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    pub fn tokens(&self) -> BTreeSet<String> {
        tokenize(
            &format!("{} {} {}", self.path, self.summary, self.description),
            MIN_ENTITY_TOKEN,
        )
    }
}

fn str_field(value: &serde_json::Value, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

/// Parse an API document (OpenAPI `paths` object or an `endpoints` array)
///
/// Fails only when the document is not JSON at all.
pub fn parse_api_spec(content: &str) -> Result<Vec<ApiEndpoint>, serde_json::Error> {
    let doc: serde_json::Value = serde_json::from_str(content)?;
    let mut endpoints = Vec::new();

    if let Some(paths) = doc.get("paths").and_then(|p| p.as_object()) {
        for (path, operations) in paths {
            let Some(operations) = operations.as_object() else {
                continue;
            };
            for (method, operation) in operations {
                if !HTTP_METHODS.contains(&method.to_lowercase().as_str()) {
                    continue;
                }
                endpoints.push(ApiEndpoint {
                    method: method.to_uppercase(),
                    path: path.clone(),
                    summary: str_field(operation, "summary"),
                    description: str_field(operation, "description"),
                });
            }
        }
    }

    let listed = doc
        .get("endpoints")
        .and_then(|e| e.as_array())
        .or_else(|| doc.as_array());
    if let Some(listed) = listed {
        for item in listed {
            let path = str_field(item, "path");
            if path.is_empty() {
                continue;
            }
            let method = str_field(item, "method");
            endpoints.push(ApiEndpoint {
                method: if method.is_empty() {
                    "GET".to_string()
                } else {
                    method.to_uppercase()
                },
                path,
                summary: str_field(item, "summary"),
                description: str_field(item, "description"),
            });
        }
    }

    Ok(endpoints)
}

/// Endpoints of an API document; malformed JSON yields none
pub fn extract_endpoints(content: &str) -> Vec<ApiEndpoint> {
    parse_api_spec(content).unwrap_or_default()
}

/// A data-model heading naming a table, entity or schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEntity {
    /// Heading text with the Table/Entity/Schema marker removed
    pub name: String,
    pub heading: String,
}

impl DataEntity {
    pub fn tokens(&self) -> BTreeSet<String> {
        tokenize(&self.name, MIN_ENTITY_TOKEN)
    }
}

pub fn extract_entities(content: &str) -> Vec<DataEntity> {
    content
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim_start();
            if !trimmed.starts_with('#') {
                return None;
            }
            let heading = trimmed.trim_start_matches('#').trim();
            if !entity_heading_re().is_match(heading) {
                return None;
            }
            let name = entity_heading_re()
                .replace_all(heading, " ")
                .split(|c: char| c.is_whitespace() || c == ':' || c == '`')
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if name.is_empty() {
                return None;
            }
            Some(DataEntity {
                name,
                heading: heading.to_string(),
            })
        })
        .collect()
}

/// A checkbox or numbered list item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub text: String,
    pub line: usize,
}

impl TaskItem {
    pub fn tokens(&self) -> BTreeSet<String> {
        tokenize(&self.text, MIN_TASK_TOKEN)
    }
}

pub fn extract_tasks(content: &str) -> Vec<TaskItem> {
    content
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            task_re().captures(line).map(|caps| TaskItem {
                text: caps[1].to_string(),
                line: i + 1,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_requirements() {
        let content = "# Requirements\n\
            - REQ-AUTH-001: User login with email\n\
            - **REQ-API-002**: Project listing endpoint\n\
            REQ-API-002: duplicate is ignored\n\
            Not a requirement: REQ-lower-1: nope\n";
        let reqs = extract_requirements(content);
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[0].id, "REQ-AUTH-001");
        assert_eq!(reqs[0].code, "AUTH");
        assert_eq!(reqs[0].category, RequirementCategory::Authentication);
        assert_eq!(reqs[1].id, "REQ-API-002");
        assert_eq!(reqs[1].title, "Project listing endpoint");
    }

    #[test]
    fn test_classify_order() {
        assert_eq!(
            RequirementCategory::classify("User authentication endpoint"),
            RequirementCategory::Authentication
        );
        assert_eq!(
            RequirementCategory::classify("Store invoices in the database"),
            RequirementCategory::Data
        );
        assert_eq!(RequirementCategory::classify("Admin UI page"), RequirementCategory::Ui);
        assert_eq!(
            RequirementCategory::classify("Public REST endpoint"),
            RequirementCategory::Api
        );
        assert_eq!(
            RequirementCategory::classify("Encrypt secrets with strong ciphers"),
            RequirementCategory::Security
        );
        assert_eq!(
            RequirementCategory::classify("Send weekly digest"),
            RequirementCategory::General
        );
    }

    #[test]
    fn test_parse_openapi_paths() {
        let spec = r#"{"openapi":"3.0.0","paths":{"/api/auth":{"post":{"summary":"User authentication"},"parameters":[]}}}"#;
        let endpoints = extract_endpoints(spec);
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].label(), "POST /api/auth");
        assert!(endpoints[0].tokens().contains("authentication"));
    }

    #[test]
    fn test_parse_endpoints_array() {
        let spec = r#"{"endpoints":[{"method":"get","path":"/api/users","description":"List users"},{"method":"get"}]}"#;
        let endpoints = extract_endpoints(spec);
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].method, "GET");
        assert_eq!(endpoints[0].description, "List users");
    }

    #[test]
    fn test_malformed_api_spec_is_empty() {
        assert!(extract_endpoints("not json {").is_empty());
        assert!(parse_api_spec("not json {").is_err());
        assert!(parse_api_spec("{}").unwrap().is_empty());
    }

    #[test]
    fn test_extract_entities() {
        let content = "# Data Model\n\n## UserProfile Table\n- id\n### Entity: Invoice\n## Notes\n## Schema\n";
        let entities = extract_entities(content);
        let names: Vec<_> = entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["UserProfile", "Invoice"]);
        assert!(entities[0].tokens().contains("profile"));
    }

    #[test]
    fn test_extract_tasks() {
        let content = "# Tasks\n- [ ] Build login form\n- [x] Create users table\n1. Write docs\n2) Ship it\n- plain bullet\n";
        let tasks = extract_tasks(content);
        let texts: Vec<_> = tasks.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["Build login form", "Create users table", "Write docs", "Ship it"]
        );
        assert_eq!(tasks[0].line, 2);
    }
}
