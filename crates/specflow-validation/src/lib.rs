//! Specflow Validation
//!
//! Cross-artifact consistency checks. Rules are data ([`ValidationRule`] with
//! a closed [`RuleCheck`] evaluator); the engine runs every enabled rule
//! through a fixed dispatcher and persists an immutable report.
//!
//! ## Layers
//!
//! 1. **Checks** (`checks`): one evaluator per rule type.
//! 2. **Engine** (`engine`): rule registry and report production.
//! 3. **Service** (`service`): loads a project's latest artifacts, validates
//!    them and writes each artifact's status back to the store.
//! 4. **Dashboard** (`dashboard`): aggregate view over report history.
//!
//! [`ValidationRule`]: specflow_core::ValidationRule
//! [`RuleCheck`]: specflow_core::RuleCheck

pub mod checks;
pub mod dashboard;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod service;

pub use checks::{evaluate, CheckOutcome};
pub use dashboard::{DashboardMetrics, RuleStats, ValidationDashboard};
pub use defaults::{default_rules, REQ_API_RULE, REQ_DATA_RULE, REQ_TASK_RULE, STACK_DEP_RULE};
pub use engine::ValidationEngine;
pub use error::{EvaluationError, Result, ValidationError};
pub use service::{artifact_status, ValidationService};
