//! CLI command definitions

use clap::{Parser, Subcommand};
use specflow_core::config::ServiceConfig;
use specflow_core::Phase;
use std::path::PathBuf;

use super::output::OutputFormat;

/// Specflow: phase orchestration, cross-artifact validation and traceability
#[derive(Parser, Debug)]
#[command(name = "specflow")]
#[command(about = "Specflow - phase orchestration, artifact validation and traceability", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (TOML, or YAML by extension)
    #[arg(short, long, env = "SPECFLOW_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API
    Serve {
        /// Host to bind to
        #[arg(long, env = "SPECFLOW_HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, env = "SPECFLOW_PORT")]
        port: Option<u16>,

        /// Delay between synthesis steps in milliseconds
        #[arg(long, env = "SPECFLOW_THINK_TIME_MS")]
        think_time_ms: Option<u64>,
    },

    /// Validate a directory of artifact files with the built-in rules
    ///
    /// Exit codes: 0 pass, 1 fail, 2 warning, 3 invalid input, 10 internal error.
    Validate {
        /// Directory containing requirements.md, api_spec.json, ...
        #[arg(short, long)]
        dir: PathBuf,

        /// Phase recorded on the report
        #[arg(long, default_value = "spec")]
        phase: Phase,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Compute the requirement coverage report for a directory of artifacts
    Trace {
        #[arg(short, long)]
        dir: PathBuf,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl Commands {
    /// Apply `serve` flags on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut ServiceConfig) {
        if let Commands::Serve {
            host,
            port,
            think_time_ms,
        } = self
        {
            if let Some(host) = host {
                config.server.host = host.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
            if let Some(ms) = think_time_ms {
                config.orchestrator.think_time_ms = *ms;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_validate() {
        let cli = Cli::try_parse_from([
            "specflow",
            "validate",
            "--dir",
            "artifacts",
            "--phase",
            "dependencies",
            "--format",
            "json",
        ])
        .unwrap();

        match cli.command {
            Commands::Validate { dir, phase, format } => {
                assert_eq!(dir, PathBuf::from("artifacts"));
                assert_eq!(phase, Phase::Dependencies);
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_unknown_phase() {
        assert!(Cli::try_parse_from(["specflow", "validate", "--dir", ".", "--phase", "launch"]).is_err());
    }

    #[test]
    fn test_serve_overrides() {
        let cli = Cli::try_parse_from([
            "specflow",
            "serve",
            "--port",
            "9000",
            "--think-time-ms",
            "5",
        ])
        .unwrap();

        let mut config = ServiceConfig::default();
        cli.command.apply_overrides(&mut config);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.orchestrator.think_time_ms, 5);
    }
}
