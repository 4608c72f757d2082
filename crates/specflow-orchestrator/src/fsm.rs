//! Phase run state machine
//!
//! Pure transitions over a [`RunRecord`]. The project actor feeds it the
//! `Start`, `StepCompleted` and `Pause` events and carries out the returned
//! instruction (schedule a timer, persist an artifact, transition phases).
//! Nothing here touches the store or the clock.

use chrono::{DateTime, Utc};
use specflow_core::{OrchestrationError, Phase, RunRecord};

use crate::plan::{plan, SynthesisStep};

/// Reaction to a start request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartStep {
    /// A run is already active; nothing changes
    Coalesced,
    /// Synthesis is finished but the gate is closed
    AwaitApproval,
    /// Synthesis is finished and the gate is open: transition first
    Transition,
    /// A new run began; schedule this step
    Schedule(SynthesisStep),
}

/// Reaction to a timer firing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Run id mismatch or run no longer active
    Stale,
    /// Persist this step's artifact, then call [`PhaseRun::after_persist`]
    Synthesize(SynthesisStep),
}

/// What follows a persisted artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterStep {
    Schedule(SynthesisStep),
    /// Last step of a gated phase without approval
    Halt,
    /// Last step and the boundary may be crossed
    Transition,
}

/// The run of one phase
#[derive(Debug, Clone, Copy)]
pub struct PhaseRun {
    pub phase: Phase,
    /// Approval flag for the phase's gate (always true for ungated phases)
    pub approved: bool,
}

impl PhaseRun {
    pub fn new(phase: Phase, approved: bool) -> Self {
        Self { phase, approved }
    }

    fn steps(&self) -> &'static [SynthesisStep] {
        plan(self.phase)
    }

    pub fn synthesis_complete(&self, run: &RunRecord) -> bool {
        run.next_step >= self.steps().len()
    }

    fn gate_closed(&self) -> bool {
        self.phase.is_gated() && !self.approved
    }

    pub fn start(
        &self,
        run: &mut RunRecord,
        now: DateTime<Utc>,
    ) -> Result<StartStep, OrchestrationError> {
        if self.phase.is_terminal() {
            return Err(OrchestrationError::AlreadyFinal);
        }
        if run.is_running {
            return Ok(StartStep::Coalesced);
        }
        if self.synthesis_complete(run) {
            if self.gate_closed() {
                run.awaiting_approval = true;
                return Ok(StartStep::AwaitApproval);
            }
            return Ok(StartStep::Transition);
        }

        let step = self.steps()[run.next_step];
        run.run_id += 1;
        run.is_running = true;
        run.awaiting_approval = false;
        run.last_error = None;
        run.started_at = Some(now);
        run.current_agent_label = Some(step.agent_label.to_string());
        Ok(StartStep::Schedule(step))
    }

    pub fn step_completed(&self, run: &RunRecord, run_id: u64) -> StepOutcome {
        if run_id != run.run_id || !run.is_running {
            return StepOutcome::Stale;
        }
        match self.steps().get(run.next_step) {
            Some(step) => StepOutcome::Synthesize(*step),
            None => StepOutcome::Stale,
        }
    }

    pub fn after_persist(&self, run: &mut RunRecord) -> AfterStep {
        run.next_step += 1;
        if let Some(step) = self.steps().get(run.next_step) {
            run.current_agent_label = Some(step.agent_label.to_string());
            return AfterStep::Schedule(*step);
        }
        if self.gate_closed() {
            run.is_running = false;
            run.awaiting_approval = true;
            run.current_agent_label = None;
            return AfterStep::Halt;
        }
        AfterStep::Transition
    }

    /// Continue an active run into the first step of this (new) phase.
    /// Stops the run at the terminal phase.
    pub fn continue_run(&self, run: &mut RunRecord) -> Option<SynthesisStep> {
        match self.steps().first() {
            Some(step) if run.is_running => {
                run.current_agent_label = Some(step.agent_label.to_string());
                Some(*step)
            }
            _ => {
                run.is_running = false;
                run.current_agent_label = None;
                None
            }
        }
    }

    pub fn pause(run: &mut RunRecord) -> Result<(), OrchestrationError> {
        if !run.is_running {
            return Err(OrchestrationError::invalid_state("no active run to pause"));
        }
        run.is_running = false;
        run.current_agent_label = None;
        Ok(())
    }

    pub fn abort(run: &mut RunRecord, error: impl Into<String>) {
        run.is_running = false;
        run.current_agent_label = None;
        run.last_error = Some(error.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> RunRecord {
        RunRecord::new("p", Utc::now())
    }

    #[test]
    fn test_start_schedules_first_step() {
        let mut run = record();
        let fsm = PhaseRun::new(Phase::Analysis, true);
        let step = fsm.start(&mut run, Utc::now()).unwrap();
        assert_eq!(step, StartStep::Schedule(plan(Phase::Analysis)[0]));
        assert!(run.is_running);
        assert_eq!(run.run_id, 1);
        assert_eq!(run.current_agent_label.as_deref(), Some("Business Analyst"));

        assert_eq!(fsm.start(&mut run, Utc::now()).unwrap(), StartStep::Coalesced);
        assert_eq!(run.run_id, 1);
    }

    #[test]
    fn test_start_at_done_is_final() {
        let mut run = record();
        let err = PhaseRun::new(Phase::Done, true)
            .start(&mut run, Utc::now())
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::AlreadyFinal));
    }

    #[test]
    fn test_gated_phase_halts_then_transitions_once_approved() {
        let mut run = record();
        let closed = PhaseRun::new(Phase::StackSelection, false);
        closed.start(&mut run, Utc::now()).unwrap();

        assert!(matches!(closed.step_completed(&run, 1), StepOutcome::Synthesize(_)));
        assert_eq!(closed.after_persist(&mut run), AfterStep::Halt);
        assert!(!run.is_running);
        assert!(run.awaiting_approval);

        assert_eq!(closed.start(&mut run, Utc::now()).unwrap(), StartStep::AwaitApproval);
        let open = PhaseRun::new(Phase::StackSelection, true);
        assert_eq!(open.start(&mut run, Utc::now()).unwrap(), StartStep::Transition);
    }

    #[test]
    fn test_stale_completion_after_pause() {
        let mut run = record();
        let fsm = PhaseRun::new(Phase::Spec, true);
        fsm.start(&mut run, Utc::now()).unwrap();
        PhaseRun::pause(&mut run).unwrap();

        assert_eq!(fsm.step_completed(&run, 1), StepOutcome::Stale);
        assert_eq!(run.next_step, 0);

        fsm.start(&mut run, Utc::now()).unwrap();
        assert_eq!(fsm.step_completed(&run, 1), StepOutcome::Stale);
        assert!(matches!(fsm.step_completed(&run, 2), StepOutcome::Synthesize(s) if s.artifact_name == "api_spec.json"));
    }

    #[test]
    fn test_pause_without_run() {
        let mut run = record();
        assert!(matches!(
            PhaseRun::pause(&mut run),
            Err(OrchestrationError::InvalidState(_))
        ));
    }

    #[test]
    fn test_ungated_phase_transitions_and_continues() {
        let mut run = record();
        let analysis = PhaseRun::new(Phase::Analysis, true);
        analysis.start(&mut run, Utc::now()).unwrap();
        assert!(matches!(analysis.after_persist(&mut run), AfterStep::Schedule(_)));
        assert_eq!(analysis.after_persist(&mut run), AfterStep::Transition);

        run.reset_for_phase();
        let next = PhaseRun::new(Phase::StackSelection, false).continue_run(&mut run);
        assert_eq!(next.map(|s| s.artifact_name), Some("stack_proposal.md"));

        let end = PhaseRun::new(Phase::Done, true).continue_run(&mut run);
        assert!(end.is_none());
        assert!(!run.is_running);
    }
}
