//! Specflow Core
//!
//! Shared foundation for the Specflow workspace: the project/artifact/report
//! data model, the wire enums, the error taxonomy, the store-of-record
//! interfaces (with an in-memory implementation), artifact role resolution,
//! the injectable clock, service configuration and the keyword tokenizer used
//! by both the validation and the traceability engines.
//!
//! ## Architecture
//!
//! 1. **Model** (`model`): Project, Artifact, PhaseHistoryEntry, RunRecord and
//!    the validation report types.
//! 2. **Rules** (`rules`): the closed rule definition consumed by the
//!    validation engine and persisted by the report store.
//! 3. **Store** (`store`): async traits for the collaborator store of record
//!    and `MemoryStore`.
//! 4. **Artifacts** (`artifacts`): role lookup over a named artifact set.
//! 5. **Clock** (`clock`): time source and think-time sleeping.
//! 6. **Config** (`config`): layered `ServiceConfig`.
//! 7. **Text** (`text`): tokenization and keyword overlap.

pub mod artifacts;
pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod rules;
pub mod store;
pub mod text;

pub use artifacts::{latest_versions, ArtifactRole, ArtifactSet};
pub use clock::{Clock, InstantClock, SystemClock};
pub use config::{ConfigError, LogFormat, ServiceConfig};
pub use error::{OrchestrationError, ParseEnumError, Result, StoreError};
pub use model::{
    Artifact, ArtifactStatus, Phase, PhaseHistoryEntry, Project, ReportMetadata, ReportStatus,
    RuleType, RunRecord, Severity, ValidationReport, ValidationResult,
};
pub use rules::{RuleCheck, ValidationRule};
pub use store::{
    ArtifactStore, MemoryStore, ProjectStore, ReportStore, RunStore, StoreHandles, StoreResult,
};

/// Crate version (from Cargo.toml)
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
