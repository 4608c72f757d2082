//! Specflow API
//!
//! HTTP surface and command-line front end over the phase orchestrator,
//! the validation engine and the traceability engine.
//!
//! ## Layout
//!
//! 1. **Handlers** (`handler/`): axum routes, the JSON response envelope and
//!    request middleware (logging with the acting user, request metrics).
//!
//! 2. **Errors** (`error.rs`): maps engine errors to HTTP status codes and
//!    machine-readable error codes.
//!
//! 3. **Telemetry** (`telemetry/`): tracing subscriber setup and the
//!    Prometheus registry served on `/metrics`.
//!
//! 4. **CLI** (`cli/`): `serve`, plus offline `validate` and `trace` over a
//!    directory of artifact files.
//!
//! ## CLI Usage
//!
//! ```bash
//! # Run the API on port 8080
//! specflow serve --port 8080
//!
//! # Validate a directory of artifacts
//! specflow validate --dir ./artifacts --phase spec --format json
//!
//! # Requirement coverage for the same directory
//! specflow trace --dir ./artifacts
//! ```

pub mod cli;
pub mod error;
pub mod handler;
pub mod telemetry;

pub use cli::{Cli, Commands, ExitCode, OutputFormat};
pub use error::{ApiError, StartupError};
pub use handler::{create_router, ApiResponse, AppState};
pub use telemetry::{init_tracing, LogTarget, SpecflowMetrics};
