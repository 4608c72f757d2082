//! Specflow Orchestrator
//!
//! Drives a project through analysis → stack_selection → spec → dependencies
//! → solutioning → done, synthesizing each phase's artifacts in plan order.
//!
//! ## Architecture
//!
//! - [`Orchestrator`] is the public handle. It lazily spawns one actor per
//!   project and forwards commands over a bounded channel.
//! - The actor owns the project row and its [`specflow_core::RunRecord`], and
//!   applies the pure [`fsm::PhaseRun`] transitions.
//! - Think-time between steps is slept on the injected
//!   [`specflow_core::Clock`], so tests run with `InstantClock`.
//! - Gated phases (stack_selection, dependencies) halt after synthesis until
//!   approved. At each halt the validation and traceability verdicts are
//!   computed and logged; they never block.

pub mod actor;
pub mod fsm;
pub mod orchestrator;
pub mod plan;
pub mod progress;
pub mod templates;

pub use actor::Gate;
pub use fsm::{AfterStep, PhaseRun, StartStep, StepOutcome};
pub use orchestrator::Orchestrator;
pub use plan::{plan, quality_score, remaining_steps, SynthesisStep};
pub use progress::{percent_complete, Progress, StartOutcome};
