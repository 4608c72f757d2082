//! Templated artifact bodies
//!
//! Stand-ins for generated content. The documents share one vocabulary
//! (accounts, project records, search, dashboard, audit trail) so the
//! requirements, API paths, data tables, stack categories and tasks line up
//! and the built-in rules pass on a full run.

use serde_json::json;
use specflow_core::Project;

fn idea_or_default(project: &Project) -> &str {
    let idea = project.idea.trim();
    if idea.is_empty() {
        "No product idea was supplied."
    } else {
        idea
    }
}

/// Body for a planned artifact; unknown names get a generic note
pub fn render(artifact_name: &str, project: &Project) -> String {
    match artifact_name {
        "project_brief.md" => project_brief(project),
        "requirements.md" => requirements(project),
        "stack_proposal.md" => stack_proposal(project),
        "api_spec.json" => api_spec(project),
        "data_model.md" => data_model(project),
        "architecture.md" => architecture(project),
        "dependencies.json" => dependencies(project),
        "tasks.md" => tasks(project),
        other => format!("# {other}\n\nGenerated for {}.\n", project.name),
    }
}

fn project_brief(project: &Project) -> String {
    format!(
        "# Project Brief: {name}\n\n\
         ## Vision\n{idea}\n\n\
         ## Context\n{description}\n\n\
         ## Goals\n\
         - Let people register an account and manage their project records\n\
         - Give owners a dashboard of project activity\n\
         - Keep an audit trail of account changes\n\n\
         ## Stakeholders\n\
         - Account holders\n\
         - Administrators\n",
        name = project.name,
        idea = idea_or_default(project),
        description = if project.description.trim().is_empty() {
            "-"
        } else {
            project.description.trim()
        },
    )
}

fn requirements(project: &Project) -> String {
    format!(
        "# Requirements: {name}\n\n\
         {idea}\n\n\
         ## Functional Requirements\n\
         - REQ-AUTH-001: User account registration and login\n\
         - REQ-API-001: Project records exposed through a REST endpoint\n\
         - REQ-API-002: Search endpoint for project records\n\
         - REQ-DATA-001: Store user account details\n\
         - REQ-DATA-002: Persist project records with ownership\n\
         - REQ-UI-001: Dashboard page summarising project activity\n\n\
         ## Non-functional Requirements\n\
         - REQ-SEC-001: Audit trail for account changes\n",
        name = project.name,
        idea = idea_or_default(project),
    )
}

fn stack_proposal(project: &Project) -> String {
    format!(
        "# Technology Stack Proposal: {name}\n\n\
         ## Recommended Stack\n\
         - Frontend: React with TypeScript\n\
         - Backend: Rust with axum\n\
         - Database: PostgreSQL\n\
         - Infrastructure: Containers on a managed platform\n\n\
         ## Rationale\n\
         A typed frontend and backend keep the project record contracts honest; \
         PostgreSQL covers relational account and audit data.\n",
        name = project.name,
    )
}

fn api_spec(project: &Project) -> String {
    let doc = json!({
        "openapi": "3.0.3",
        "info": { "title": format!("{} API", project.name), "version": "0.1.0" },
        "paths": {
            "/api/auth/register": {
                "post": { "summary": "Register user account" }
            },
            "/api/auth/login": {
                "post": { "summary": "User login" }
            },
            "/api/projects": {
                "get": { "summary": "List project records" },
                "post": { "summary": "Create project record" }
            },
            "/api/projects/search": {
                "get": { "summary": "Search project records" }
            },
            "/api/dashboard": {
                "get": { "summary": "Dashboard activity summary" }
            },
            "/api/audit": {
                "get": { "summary": "Account audit trail" }
            }
        }
    });
    serde_json::to_string_pretty(&doc).unwrap_or_else(|_| doc.to_string())
}

fn data_model(project: &Project) -> String {
    format!(
        "# Data Model: {name}\n\n\
         ## UserAccount Table\n\
         - id: uuid, primary key\n\
         - email: text, unique\n\
         - password_hash: text\n\n\
         ## Project Table\n\
         - id: uuid, primary key\n\
         - owner_id: uuid, references UserAccount\n\
         - title: text\n\n\
         ## AuditEvent Table\n\
         - id: uuid, primary key\n\
         - account_id: uuid\n\
         - change: jsonb\n",
        name = project.name,
    )
}

fn architecture(project: &Project) -> String {
    format!(
        "# Architecture: {name}\n\n\
         ## Components\n\
         - Web client served as static assets\n\
         - HTTP API handling accounts, project records and search\n\
         - Relational database\n\n\
         ## Data Flow\n\
         Requests pass through authentication, reach the API handlers and are \
         recorded in the audit trail when they change an account.\n",
        name = project.name,
    )
}

fn dependencies(project: &Project) -> String {
    let doc = json!({
        "project": project.name,
        "categories": {
            "frontend": [
                { "name": "react", "version": "18.x", "purpose": "UI rendering" },
                { "name": "typescript", "version": "5.x", "purpose": "Typed client code" }
            ],
            "backend": [
                { "name": "axum", "version": "0.7", "purpose": "HTTP routing" },
                { "name": "sqlx", "version": "0.7", "purpose": "Database access" }
            ],
            "database": [
                { "name": "postgresql", "version": "16", "purpose": "Primary store" }
            ],
            "infrastructure": [
                { "name": "docker", "version": "24", "purpose": "Container images" }
            ]
        }
    });
    serde_json::to_string_pretty(&doc).unwrap_or_else(|_| doc.to_string())
}

fn tasks(project: &Project) -> String {
    format!(
        "# Delivery Tasks: {name}\n\n\
         ## Milestone 1: Foundations\n\
         - [ ] Implement user account registration and login\n\
         - [ ] Create project records schema and migrations\n\
         - [ ] Build project search endpoint\n\n\
         ## Milestone 2: Experience\n\
         - [ ] Build dashboard page for project activity\n\
         - [ ] Record audit trail for account changes\n\n\
         ## Release\n\
         1. Provision frontend, backend, database and infrastructure environments\n",
        name = project.name,
    )
}
