//! CLI module: offline validation and traceability over an artifact directory

pub mod commands;
pub mod output;

pub use commands::{Cli, Commands};
pub use output::{render_coverage, render_report, OutputFormat};

use specflow_core::{ArtifactSet, MemoryStore, Phase, ReportStatus, ValidationReport};
use specflow_traceability::{CoverageReport, TraceabilityEngine};
use specflow_validation::{default_rules, ValidationEngine, ValidationError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Project id recorded on offline reports
const OFFLINE_PROJECT: &str = "local";

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// All validations passed
    Success = 0,
    /// An error-severity rule failed
    ValidationError = 1,
    /// A warning-severity rule failed
    ValidationWarning = 2,
    /// Invalid input or arguments
    InvalidInput = 3,
    InternalError = 10,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    pub fn from_status(status: ReportStatus) -> Self {
        match status {
            ReportStatus::Pass => ExitCode::Success,
            ReportStatus::Warning => ExitCode::ValidationWarning,
            ReportStatus::Fail => ExitCode::ValidationError,
        }
    }
}

/// CLI failures
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No artifact files found in {0}")]
    EmptyDirectory(PathBuf),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Io { .. } | CliError::EmptyDirectory(_) => ExitCode::InvalidInput,
            CliError::Validation(_) | CliError::Output(_) => ExitCode::InternalError,
        }
    }
}

/// Read every UTF-8 file directly under `dir` as an artifact named by its
/// file name
pub fn load_artifact_dir(dir: &Path) -> Result<ArtifactSet, CliError> {
    let io_err = |source| CliError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(io_err)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let mut artifacts = ArtifactSet::new();
    for path in paths {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                debug!(artifact = %name, bytes = content.len(), "Loaded artifact");
                artifacts.insert(name, content);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable artifact"),
        }
    }

    if artifacts.is_empty() {
        return Err(CliError::EmptyDirectory(dir.to_path_buf()));
    }
    Ok(artifacts)
}

/// Run the built-in rules over a directory
pub async fn validate_dir(dir: &Path, phase: Phase) -> Result<ValidationReport, CliError> {
    let artifacts = load_artifact_dir(dir)?;
    let engine = ValidationEngine::with_rules(Arc::new(MemoryStore::new()), default_rules());
    Ok(engine
        .validate_artifacts(OFFLINE_PROJECT, phase, &artifacts)
        .await?)
}

pub fn trace_dir(dir: &Path) -> Result<CoverageReport, CliError> {
    let artifacts = load_artifact_dir(dir)?;
    Ok(TraceabilityEngine::new().generate_coverage_report(OFFLINE_PROJECT, &artifacts))
}

/// `specflow validate`: print the report, exit by its status
pub async fn execute_validate(dir: &Path, phase: Phase, format: OutputFormat) -> ExitCode {
    let rendered = match validate_dir(dir, phase).await {
        Ok(report) => render_report(&report, format)
            .map(|text| (text, ExitCode::from_status(report.overall_status)))
            .map_err(CliError::from),
        Err(e) => Err(e),
    };
    finish(rendered)
}

/// `specflow trace`: print the coverage report
pub fn execute_trace(dir: &Path, format: OutputFormat) -> ExitCode {
    let rendered = trace_dir(dir).and_then(|report| {
        render_coverage(&report, format)
            .map(|text| (text, ExitCode::Success))
            .map_err(CliError::from)
    });
    finish(rendered)
}

fn finish(rendered: Result<(String, ExitCode), CliError>) -> ExitCode {
    match rendered {
        Ok((text, code)) => {
            println!("{}", text.trim_end());
            code
        }
        Err(e) => {
            eprintln!("error: {e}");
            e.exit_code()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_exit_code_conversion() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::ValidationError), 1);
        assert_eq!(i32::from(ExitCode::ValidationWarning), 2);
        assert_eq!(i32::from(ExitCode::InvalidInput), 3);
        assert_eq!(i32::from(ExitCode::InternalError), 10);
    }

    #[test]
    fn test_exit_code_from_status() {
        assert_eq!(ExitCode::from_status(ReportStatus::Pass), ExitCode::Success);
        assert_eq!(ExitCode::from_status(ReportStatus::Warning), ExitCode::ValidationWarning);
        assert_eq!(ExitCode::from_status(ReportStatus::Fail), ExitCode::ValidationError);
    }

    #[test]
    fn test_load_artifact_dir() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "requirements.md", "REQ-API-001: Search");
        write(dir.path(), "tasks.md", "- [ ] Build search");
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let artifacts = load_artifact_dir(dir.path()).unwrap();
        assert_eq!(artifacts.names(), vec!["requirements.md", "tasks.md"]);
    }

    #[test]
    fn test_empty_or_missing_dir_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_artifact_dir(dir.path()).unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::InvalidInput);

        let err = load_artifact_dir(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));
        assert_eq!(execute_trace(&dir.path().join("missing"), OutputFormat::Text), ExitCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_validate_dir_fails_unmatched_api_requirement() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "requirements.md", "REQ-API-001: Invoice export endpoint");
        write(dir.path(), "api_spec.json", r#"{"paths":{"/api/health":{"get":{}}}}"#);

        let report = validate_dir(dir.path(), Phase::Spec).await.unwrap();
        assert_eq!(report.overall_status, ReportStatus::Fail);
        assert_eq!(report.project_id, OFFLINE_PROJECT);

        let text = render_report(&report, OutputFormat::Text).unwrap();
        assert!(text.starts_with("Validation FAIL (spec)"));
        assert!(text.contains("REQ-API-001"));

        assert_eq!(
            execute_validate(dir.path(), Phase::Spec, OutputFormat::Json).await,
            ExitCode::ValidationError
        );
    }

    #[test]
    fn test_trace_dir_renders_json() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "requirements.md", "REQ-DATA-001: Store invoices");
        write(dir.path(), "data_model.md", "## Invoice Table\n- id: uuid");

        let report = trace_dir(dir.path()).unwrap();
        assert_eq!(report.matrix.total_requirements, 1);

        let json: serde_json::Value =
            serde_json::from_str(&render_coverage(&report, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["matrix"]["totalRequirements"], 1);
    }
}
