//! Route definitions
//!
//! Orchestration:
//! - POST /projects, GET /projects/:id, GET /projects/:id/artifacts
//! - POST /projects/:id/orchestration/start|pause, GET /projects/:id/orchestration/progress
//! - POST /projects/:id/phases/advance, GET /projects/:id/phases/history
//! - POST /projects/:id/stack/approve, POST /projects/:id/dependencies/approve
//!
//! Validation:
//! - POST /validation/run
//! - GET /validation/reports/:project_id?limit=N, GET /validation/reports/report/:report_id
//! - GET /validation/dashboard/:project_id
//! - GET|POST /validation/rules, PATCH /validation/rules/:rule_id
//!
//! Traceability:
//! - GET /traceability/:project_id, GET /traceability/:project_id/report
//!
//! Service:
//! - GET /health, GET /metrics

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use specflow_core::config::ServiceConfig;
use specflow_core::{
    Artifact, Clock, OrchestrationError, PhaseHistoryEntry, Project, StoreHandles,
    ValidationReport, ValidationRule,
};
use specflow_orchestrator::{Orchestrator, Progress, StartOutcome};
use specflow_traceability::{CoverageReport, TraceabilityEngine, TraceabilityMatrix};
use specflow_validation::{ValidationDashboard, ValidationEngine, ValidationService};
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use super::middleware::{request_logging_middleware, telemetry_middleware};
use super::{
    ApiResponse, ComponentHealth, CreateProjectRequest, CreateRuleRequest, HealthResponse,
    HealthStatus, HistoryQuery, UpdateRuleRequest, ValidationRunRequest,
};
use crate::error::{ApiError, StartupError};
use crate::telemetry::SpecflowMetrics;

/// State shared across all routes
#[derive(Debug, Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub validation: ValidationService,
    pub traceability: TraceabilityEngine,
    pub metrics: Arc<SpecflowMetrics>,
    pub start_time: Instant,
}

impl AppState {
    /// Wire the engines over one set of stores
    pub async fn new(
        stores: StoreHandles,
        clock: Arc<dyn Clock>,
        config: &ServiceConfig,
    ) -> Result<Self, StartupError> {
        let engine = Arc::new(ValidationEngine::initialize(stores.reports.clone()).await?);
        let validation = ValidationService::new(engine, stores.clone(), config.validation.clone());
        let orchestrator = Orchestrator::new(
            stores,
            clock,
            config.orchestrator.clone(),
            Some(validation.clone()),
        );

        Ok(Self {
            orchestrator,
            validation,
            traceability: TraceabilityEngine::new(),
            metrics: Arc::new(SpecflowMetrics::new()?),
            start_time: Instant::now(),
        })
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn respond<T>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data, Uuid::new_v4().to_string()))
}

/// Count an orchestrator command and convert its error
fn tracked<T>(
    state: &AppState,
    command: &str,
    result: Result<T, OrchestrationError>,
) -> Result<T, ApiError> {
    state.metrics.record_command(command, result.is_ok());
    Ok(result?)
}

/// Create the router with all routes and layers
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Projects and orchestration
        .route("/projects", post(create_project))
        .route("/projects/:id", get(get_project))
        .route("/projects/:id/artifacts", get(list_artifacts))
        .route("/projects/:id/orchestration/start", post(start_orchestration))
        .route("/projects/:id/orchestration/pause", post(pause_orchestration))
        .route("/projects/:id/orchestration/progress", get(orchestration_progress))
        .route("/projects/:id/phases/advance", post(advance_phase))
        .route("/projects/:id/phases/history", get(phase_history))
        .route("/projects/:id/stack/approve", post(approve_stack))
        .route("/projects/:id/dependencies/approve", post(approve_dependencies))
        // Validation
        .route("/validation/run", post(run_validation))
        .route("/validation/reports/:project_id", get(validation_history))
        .route("/validation/reports/report/:report_id", get(validation_report))
        .route("/validation/dashboard/:project_id", get(validation_dashboard))
        .route("/validation/rules", get(list_rules).post(create_rule))
        .route("/validation/rules/:rule_id", patch(update_rule))
        // Traceability
        .route("/traceability/:project_id", get(traceability_matrix))
        .route("/traceability/:project_id/report", get(coverage_report))
        // Service
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_text))
        .layer(from_fn_with_state(state.metrics.clone(), telemetry_middleware))
        .layer(from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// POST /projects
pub async fn create_project(
    State(state): State<AppState>,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Project>>), ApiError> {
    let Json(request) = payload?;
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }
    let project = state
        .orchestrator
        .create_project(&request.name, &request.description, &request.idea)
        .await?;
    Ok((StatusCode::CREATED, respond(project)))
}

/// GET /projects/:id
pub async fn get_project(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Project> {
    Ok(respond(state.orchestrator.get_project(&id).await?))
}

/// GET /projects/:id/artifacts
pub async fn list_artifacts(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Artifact>> {
    Ok(respond(state.orchestrator.artifacts(&id).await?))
}

/// POST /projects/:id/orchestration/start
pub async fn start_orchestration(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StartOutcome> {
    let outcome = state.orchestrator.start(&id).await;
    Ok(respond(tracked(&state, "start", outcome)?))
}

/// POST /projects/:id/orchestration/pause
///
/// Returns the progress snapshot after the pause.
pub async fn pause_orchestration(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Progress> {
    let paused = state.orchestrator.pause(&id).await;
    tracked(&state, "pause", paused)?;
    Ok(respond(state.orchestrator.progress(&id).await?))
}

/// GET /projects/:id/orchestration/progress
pub async fn orchestration_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Progress> {
    Ok(respond(state.orchestrator.progress(&id).await?))
}

/// POST /projects/:id/phases/advance
pub async fn advance_phase(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Project> {
    let advanced = state.orchestrator.advance(&id).await;
    Ok(respond(tracked(&state, "advance", advanced)?))
}

/// GET /projects/:id/phases/history
pub async fn phase_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<PhaseHistoryEntry>> {
    Ok(respond(state.orchestrator.history(&id).await?))
}

/// POST /projects/:id/stack/approve
pub async fn approve_stack(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Project> {
    let approved = state.orchestrator.approve_stack(&id).await;
    Ok(respond(tracked(&state, "approve_stack", approved)?))
}

/// POST /projects/:id/dependencies/approve
pub async fn approve_dependencies(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Project> {
    let approved = state.orchestrator.approve_dependencies(&id).await;
    Ok(respond(tracked(&state, "approve_dependencies", approved)?))
}

/// POST /validation/run
pub async fn run_validation(
    State(state): State<AppState>,
    payload: Result<Json<ValidationRunRequest>, JsonRejection>,
) -> ApiResult<ValidationReport> {
    let Json(request) = payload?;
    let report = {
        let _timer = state.metrics.start_validation_timer();
        state
            .validation
            .validate_project(&request.project_id, request.phase)
            .await?
    };
    state.metrics.record_validation(&report);
    Ok(respond(report))
}

/// GET /validation/reports/:project_id?limit=N
pub async fn validation_history(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> ApiResult<Vec<ValidationReport>> {
    let Query(query) = query?;
    Ok(respond(state.validation.history(&project_id, query.limit).await?))
}

/// GET /validation/reports/report/:report_id
///
/// Unknown (or malformed) ids yield `data: null`.
pub async fn validation_report(
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> ApiResult<Option<ValidationReport>> {
    let report = match Uuid::parse_str(&report_id) {
        Ok(id) => state.validation.engine().get_validation_report(id).await?,
        Err(_) => None,
    };
    Ok(respond(report))
}

/// GET /validation/dashboard/:project_id
pub async fn validation_dashboard(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<ValidationDashboard> {
    Ok(respond(state.validation.dashboard(&project_id).await?))
}

/// GET /validation/rules
pub async fn list_rules(State(state): State<AppState>) -> ApiResult<Vec<ValidationRule>> {
    Ok(respond(state.validation.engine().get_rules().await))
}

/// POST /validation/rules
pub async fn create_rule(
    State(state): State<AppState>,
    payload: Result<Json<CreateRuleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ValidationRule>>), ApiError> {
    let Json(request) = payload?;
    if request.id.trim().is_empty() {
        return Err(ApiError::BadRequest("rule id must not be empty".to_string()));
    }

    let mut rule = ValidationRule::new(request.id, request.name, request.severity, request.evaluator)
        .with_description(request.description);
    if !request.enabled {
        rule = rule.disabled();
    }
    state.validation.engine().add_rule(rule.clone()).await?;
    Ok((StatusCode::CREATED, respond(rule)))
}

/// PATCH /validation/rules/:rule_id
pub async fn update_rule(
    State(state): State<AppState>,
    Path(rule_id): Path<String>,
    payload: Result<Json<UpdateRuleRequest>, JsonRejection>,
) -> ApiResult<ValidationRule> {
    let Json(request) = payload?;
    let rule = state
        .validation
        .engine()
        .set_rule_enabled(&rule_id, request.enabled)
        .await?;
    Ok(respond(rule))
}

/// GET /traceability/:project_id
pub async fn traceability_matrix(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<TraceabilityMatrix> {
    let (_, artifacts) = state.validation.load_artifacts(&project_id).await?;
    let matrix = state
        .traceability
        .generate_traceability_matrix(&project_id, &artifacts);
    state.metrics.set_coverage(&project_id, matrix.overall_coverage);
    Ok(respond(matrix))
}

/// GET /traceability/:project_id/report
pub async fn coverage_report(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<CoverageReport> {
    let (_, artifacts) = state.validation.load_artifacts(&project_id).await?;
    let report = state
        .traceability
        .generate_coverage_report(&project_id, &artifacts);
    state
        .metrics
        .set_coverage(&project_id, report.matrix.overall_coverage);
    Ok(respond(report))
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let rules = state.validation.engine().get_rules().await;
    let enabled_rules = rules.iter().filter(|r| r.enabled).count();
    let validation_engine = !rules.is_empty();

    let status = if validation_engine {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    Json(HealthResponse {
        status,
        components: ComponentHealth {
            validation_engine,
            enabled_rules,
            orchestrator: true,
        },
        uptime_seconds: state.start_time.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /metrics
pub async fn metrics_text(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let body = state.metrics.encode_text()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}
