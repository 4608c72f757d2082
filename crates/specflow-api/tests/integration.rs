//! Integration tests for the Specflow API
//!
//! Exercises the router in-process: project lifecycle, gate approvals,
//! validation runs and rules, traceability, health and metrics.

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use specflow_api::{create_router, AppState};
use specflow_core::config::ServiceConfig;
use specflow_core::{InstantClock, StoreHandles};
use std::sync::Arc;
use tower::ServiceExt;

async fn setup() -> (AppState, Router) {
    let mut config = ServiceConfig::default();
    config.orchestrator.think_time_ms = 10;
    let state = AppState::new(StoreHandles::memory(), Arc::new(InstantClock::new()), &config)
        .await
        .unwrap();
    let router = create_router(state.clone());
    (state, router)
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", "integration-test");
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn create_project(router: &Router, name: &str) -> String {
    let (status, body) = send(
        router,
        Method::POST,
        "/projects",
        Some(json!({ "name": name, "description": "test", "idea": "invoice export" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn wait_for_gate(state: &AppState, project_id: &str) {
    for _ in 0..10_000 {
        let progress = state.orchestrator.progress(project_id).await.unwrap();
        if progress.awaiting_approval && !progress.is_running {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("project {project_id} never reached its gate");
}

#[tokio::test]
async fn test_project_lifecycle_through_first_gate() {
    let (state, router) = setup().await;
    let id = create_project(&router, "Invoice Portal").await;

    let (status, body) = send(&router, Method::GET, &format!("/projects/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["currentPhase"], "analysis");
    assert_eq!(body["data"]["slug"], "invoice-portal");

    let (status, body) = send(&router, Method::POST, &format!("/projects/{id}/orchestration/start"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "started");
    assert_eq!(body["data"]["phase"], "analysis");

    // analysis transitions on its own, stack_selection halts at the gate
    wait_for_gate(&state, &id).await;

    let (_, body) = send(&router, Method::GET, &format!("/projects/{id}/orchestration/progress"), None).await;
    assert_eq!(body["data"]["currentPhase"], "stack_selection");
    assert_eq!(body["data"]["awaitingApproval"], true);

    let (status, body) = send(&router, Method::POST, &format!("/projects/{id}/dependencies/approve"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_STATE");

    let (status, body) = send(&router, Method::POST, &format!("/projects/{id}/stack/approve"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["stackApproved"], true);

    let (_, body) = send(&router, Method::GET, &format!("/projects/{id}/artifacts"), None).await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["artifactName"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"requirements.md"));
    assert!(names.contains(&"stack_proposal.md"));

    let (_, body) = send(&router, Method::GET, &format!("/projects/{id}/phases/history"), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_advance_until_final() {
    let (_, router) = setup().await;
    let id = create_project(&router, "Advance Me").await;

    for expected in ["stack_selection", "spec", "dependencies", "solutioning", "done"] {
        let (status, body) = send(&router, Method::POST, &format!("/projects/{id}/phases/advance"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["currentPhase"], expected);
    }

    let (status, body) = send(&router, Method::POST, &format!("/projects/{id}/phases/advance"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "ALREADY_FINAL");

    let (_, body) = send(&router, Method::GET, &format!("/projects/{id}/orchestration/progress"), None).await;
    assert_eq!(body["data"]["percentComplete"], 100);
}

#[tokio::test]
async fn test_project_errors() {
    let (_, router) = setup().await;

    let (status, body) = send(&router, Method::GET, "/projects/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, body) = send(&router, Method::POST, "/projects", Some(json!({ "name": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, _) = send(&router, Method::POST, "/projects", Some(json!({ "title": "x" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&router, Method::POST, "/projects/missing/orchestration/pause", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_validation_runs_and_history() {
    let (_, router) = setup().await;
    let id = create_project(&router, "Validate Me").await;

    let mut report_id = String::new();
    for _ in 0..2 {
        let (status, body) = send(
            &router,
            Method::POST,
            "/validation/run",
            Some(json!({ "projectId": id, "phase": "spec" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["totalRules"], 4);
        report_id = body["data"]["id"].as_str().unwrap().to_string();
    }

    let (_, body) = send(&router, Method::GET, &format!("/validation/reports/{id}"), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = send(&router, Method::GET, &format!("/validation/reports/{id}?limit=1"), None).await;
    let reports = body["data"].as_array().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["id"], report_id.as_str());

    let (status, body) = send(&router, Method::GET, &format!("/validation/reports/report/{report_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], report_id.as_str());

    let (status, body) = send(
        &router,
        Method::GET,
        "/validation/reports/report/00000000-0000-0000-0000-000000000000",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].is_null());

    let (status, _) = send(
        &router,
        Method::POST,
        "/validation/run",
        Some(json!({ "projectId": "missing", "phase": "spec" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &router,
        Method::POST,
        "/validation/run",
        Some(json!({ "projectId": id, "phase": "launch" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&router, Method::GET, &format!("/validation/dashboard/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_rule_management() {
    let (_, router) = setup().await;

    let (_, body) = send(&router, Method::GET, "/validation/rules", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 4);

    let rule = json!({
        "id": "STACK-DEP-002",
        "name": "Stack categories in manifest (strict)",
        "severity": "error",
        "evaluator": { "kind": "stack_dependency" }
    });
    let (status, body) = send(&router, Method::POST, "/validation/rules", Some(rule.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["id"], "STACK-DEP-002");

    let (status, body) = send(&router, Method::POST, "/validation/rules", Some(rule)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, body) = send(
        &router,
        Method::PATCH,
        "/validation/rules/STACK-DEP-002",
        Some(json!({ "enabled": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["enabled"], false);

    let (status, _) = send(
        &router,
        Method::PATCH,
        "/validation/rules/NOPE-001",
        Some(json!({ "enabled": false })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_traceability_endpoints() {
    let (state, router) = setup().await;
    let id = create_project(&router, "Trace Me").await;

    send(&router, Method::POST, &format!("/projects/{id}/orchestration/start"), None).await;
    wait_for_gate(&state, &id).await;

    let (status, body) = send(&router, Method::GET, &format!("/traceability/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["projectId"], id.as_str());
    assert!(body["data"]["totalRequirements"].as_u64().unwrap() > 0);

    let (status, body) = send(&router, Method::GET, &format!("/traceability/{id}/report"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["recommendations"].is_array());

    let (status, _) = send(&router, Method::GET, "/traceability/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_and_metrics() {
    let (_, router) = setup().await;

    let (status, body) = send(&router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["components"]["enabledRules"], 4);

    let response = router
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("specflow_http_requests_total"));
}
