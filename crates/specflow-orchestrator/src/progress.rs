//! Progress snapshots

use serde::{Deserialize, Serialize};
use specflow_core::{Phase, PhaseHistoryEntry, Project, RunRecord};
use std::time::Duration;

use crate::plan::remaining_steps;

/// Outcome of a start request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StartOutcome {
    /// A run began at `step` of `phase`
    Started { phase: Phase, step: usize },
    /// A run was already active; the request was coalesced into it
    AlreadyRunning { phase: Phase },
    /// The phase finished synthesis and waits for its gate approval
    AwaitingApproval { phase: Phase },
    /// The transition reached the terminal phase
    Finished,
}

/// Point-in-time view of a project's orchestration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub current_phase: Phase,
    pub percent_complete: u8,
    pub is_running: bool,
    pub current_agent_label: Option<String>,
    /// Seconds of think-time left across the remaining plan steps
    pub estimated_remaining: f64,
    pub phase_history: Vec<PhaseHistoryEntry>,
    pub awaiting_approval: bool,
    pub last_error: Option<String>,
}

/// `round(100 * (index + 1) / 6)`, plus 10 capped at 95 while synthesizing
pub fn percent_complete(phase: Phase, running: bool) -> u8 {
    let total = Phase::SEQUENCE.len() as f64;
    let base = (100.0 * (phase.index() + 1) as f64 / total).round() as u8;
    if running {
        base.saturating_add(10).min(95)
    } else {
        base
    }
}

impl Progress {
    pub fn compute(
        project: &Project,
        run: &RunRecord,
        phase_history: Vec<PhaseHistoryEntry>,
        think_time: Duration,
    ) -> Self {
        let phase = project.current_phase;
        let steps = remaining_steps(phase, run.next_step);
        Self {
            current_phase: phase,
            percent_complete: percent_complete(phase, run.is_running),
            is_running: run.is_running,
            current_agent_label: run.current_agent_label.clone(),
            estimated_remaining: steps as f64 * think_time.as_secs_f64(),
            phase_history,
            awaiting_approval: run.awaiting_approval,
            last_error: run.last_error.clone(),
        }
    }
}
