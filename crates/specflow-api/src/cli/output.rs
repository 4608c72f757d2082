//! Output formatting for CLI results

use clap::ValueEnum;
use specflow_core::ValidationReport;
use specflow_traceability::CoverageReport;
use std::fmt::Write;

/// Output format options for CLI results
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON for machine processing
    Json,
}

/// Render a validation report
pub fn render_report(report: &ValidationReport, format: OutputFormat) -> serde_json::Result<String> {
    if format == OutputFormat::Json {
        return serde_json::to_string_pretty(report);
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Validation {} ({})",
        report.overall_status.as_str().to_uppercase(),
        report.phase
    );
    let _ = writeln!(
        out,
        "  Rules: {} total, {} passed, {} failed, {} warnings",
        report.total_rules, report.passed_rules, report.failed_rules, report.warning_rules
    );
    for result in &report.validation_results {
        let _ = writeln!(
            out,
            "  [{}] {:<7} {} {}: {}",
            if result.passed { "PASS" } else { "FAIL" },
            result.severity.as_str(),
            result.rule_id,
            result.rule_name,
            result.message
        );
        if let Some(requirements) = result
            .affected_requirements
            .as_ref()
            .filter(|r| !r.is_empty())
        {
            let _ = writeln!(out, "         unmatched: {}", requirements.join(", "));
        }
    }
    Ok(out)
}

/// Render a coverage report
pub fn render_coverage(report: &CoverageReport, format: OutputFormat) -> serde_json::Result<String> {
    if format == OutputFormat::Json {
        return serde_json::to_string_pretty(report);
    }

    let matrix = &report.matrix;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Coverage {:.1}% across {} requirements ({} covered, {} partial, {} uncovered)",
        matrix.overall_coverage,
        matrix.total_requirements,
        matrix.covered_count,
        matrix.partial_count,
        matrix.uncovered_count
    );
    for trace in &matrix.requirements {
        let _ = writeln!(
            out,
            "  {:<14} {:<9} {:>5.1}%  {}",
            trace.requirement_id,
            trace.status.as_str(),
            trace.coverage,
            trace.title
        );
    }
    if !report.recommendations.is_empty() {
        let _ = writeln!(out, "Recommendations:");
        for recommendation in &report.recommendations {
            let _ = writeln!(out, "  - {recommendation}");
        }
    }
    Ok(out)
}
