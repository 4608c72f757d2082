//! Prometheus metrics for the Specflow service
//!
//! - `specflow_http_requests_total` (counter) - HTTP requests by method and status
//! - `specflow_validation_runs_total` (counter) - Validation runs by overall status
//! - `specflow_rule_failures_total` (counter) - Failed rule results by rule and severity
//! - `specflow_validation_duration_seconds` (histogram) - Validation run duration
//! - `specflow_orchestration_commands_total` (counter) - Orchestrator commands by result
//! - `specflow_traceability_coverage` (gauge) - Latest overall coverage per project

use prometheus::{CounterVec, Histogram, HistogramOpts, Opts, Registry};
use specflow_core::ValidationReport;
use std::time::Instant;

use super::{Result, TelemetryError};

const NAMESPACE: &str = "specflow";

/// Service metrics and the registry they are registered with
pub struct SpecflowMetrics {
    registry: Registry,
    http_requests_total: CounterVec,
    validation_runs_total: CounterVec,
    rule_failures_total: CounterVec,
    validation_duration_seconds: Histogram,
    orchestration_commands_total: CounterVec,
    traceability_coverage: prometheus::GaugeVec,
}

impl std::fmt::Debug for SpecflowMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecflowMetrics").finish_non_exhaustive()
    }
}

impl SpecflowMetrics {
    /// Create the metrics on a fresh registry
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = CounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests").namespace(NAMESPACE),
            &["method", "status"],
        )?;

        let validation_runs_total = CounterVec::new(
            Opts::new("validation_runs_total", "Total number of validation runs")
                .namespace(NAMESPACE),
            &["status"],
        )?;

        let rule_failures_total = CounterVec::new(
            Opts::new("rule_failures_total", "Total number of failed rule results")
                .namespace(NAMESPACE),
            &["rule_id", "severity"],
        )?;

        let validation_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "validation_duration_seconds",
                "Validation run duration in seconds",
            )
            .namespace(NAMESPACE)
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
        )?;

        let orchestration_commands_total = CounterVec::new(
            Opts::new(
                "orchestration_commands_total",
                "Total number of orchestrator commands",
            )
            .namespace(NAMESPACE),
            &["command", "result"],
        )?;

        let traceability_coverage = prometheus::GaugeVec::new(
            Opts::new(
                "traceability_coverage",
                "Overall requirement coverage percentage (0 - 100)",
            )
            .namespace(NAMESPACE),
            &["project_id"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(validation_runs_total.clone()))?;
        registry.register(Box::new(rule_failures_total.clone()))?;
        registry.register(Box::new(validation_duration_seconds.clone()))?;
        registry.register(Box::new(orchestration_commands_total.clone()))?;
        registry.register(Box::new(traceability_coverage.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            validation_runs_total,
            rule_failures_total,
            validation_duration_seconds,
            orchestration_commands_total,
            traceability_coverage,
        })
    }

    pub fn record_http_request(&self, method: &str, status: u16) {
        self.http_requests_total
            .with_label_values(&[method, &status.to_string()])
            .inc();
    }

    /// Count the run and each failing rule
    pub fn record_validation(&self, report: &ValidationReport) {
        self.validation_runs_total
            .with_label_values(&[report.overall_status.as_str()])
            .inc();
        for failure in report.failures() {
            self.rule_failures_total
                .with_label_values(&[&failure.rule_id, failure.severity.as_str()])
                .inc();
        }
    }

    pub fn record_command(&self, command: &str, ok: bool) {
        let result = if ok { "ok" } else { "error" };
        self.orchestration_commands_total
            .with_label_values(&[command, result])
            .inc();
    }

    pub fn set_coverage(&self, project_id: &str, coverage: f64) {
        self.traceability_coverage
            .with_label_values(&[project_id])
            .set(coverage);
    }

    /// Start a validation timer (records duration on drop)
    pub fn start_validation_timer(&self) -> ValidationTimer<'_> {
        ValidationTimer {
            start: Instant::now(),
            histogram: &self.validation_duration_seconds,
        }
    }

    /// Encode metrics as text for scraping
    pub fn encode_text(&self) -> Result<String> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Encoding(e.to_string()))
    }
}

/// RAII guard for timing validation runs
pub struct ValidationTimer<'a> {
    start: Instant,
    histogram: &'a Histogram,
}

impl Drop for ValidationTimer<'_> {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}
