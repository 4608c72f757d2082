//! Per-project actor
//!
//! Each project id is owned by exactly one task. It holds the project row and
//! the run record, processes [`Command`]s one at a time and is the only writer
//! of both, so start/pause/advance never race. Think-time waits happen in
//! short-lived timer tasks that post `StepCompleted` back to the actor.

use serde_json::json;
use specflow_core::{
    Artifact, ArtifactSet, ArtifactStatus, OrchestrationError, Phase, PhaseHistoryEntry, Project,
    ReportStatus, Result, RunRecord, StoreError,
};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::fsm::{AfterStep, PhaseRun, StartStep, StepOutcome};
use crate::orchestrator::Shared;
use crate::plan::{quality_score, SynthesisStep};
use crate::progress::{Progress, StartOutcome};
use crate::templates;

/// Approval gates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Stack,
    Dependencies,
}

impl Gate {
    pub fn phase(self) -> Phase {
        match self {
            Gate::Stack => Phase::StackSelection,
            Gate::Dependencies => Phase::Dependencies,
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Gate::Stack => "stack",
            Gate::Dependencies => "dependencies",
        })
    }
}

/// Messages handled by a project actor
pub(crate) enum Command {
    Start {
        reply: oneshot::Sender<Result<StartOutcome>>,
    },
    Pause {
        reply: oneshot::Sender<Result<()>>,
    },
    Advance {
        reply: oneshot::Sender<Result<Project>>,
    },
    Approve {
        gate: Gate,
        reply: oneshot::Sender<Result<Project>>,
    },
    Progress {
        reply: oneshot::Sender<Result<Progress>>,
    },
    StepCompleted {
        run_id: u64,
    },
}

pub(crate) struct ProjectActor {
    project: Project,
    run: RunRecord,
    shared: Arc<Shared>,
    rx: mpsc::Receiver<Command>,
    tx: mpsc::WeakSender<Command>,
}

impl ProjectActor {
    /// Spawn the actor task and return its command sender
    pub(crate) fn spawn(project: Project, mut run: RunRecord, shared: Arc<Shared>) -> mpsc::Sender<Command> {
        let (tx, rx) = mpsc::channel(shared.config.channel_capacity);

        // A run marked active in the store has no timer in this process
        if run.is_running {
            warn!(project_id = %project.id, run_id = run.run_id, "Recovered interrupted run as paused");
            run.is_running = false;
            run.current_agent_label = None;
        }

        let actor = ProjectActor {
            project,
            run,
            shared,
            rx,
            tx: tx.downgrade(),
        };
        tokio::spawn(actor.run());
        tx
    }

    async fn run(mut self) {
        debug!(project_id = %self.project.id, "Project actor started");
        while let Some(command) = self.rx.recv().await {
            self.handle(command).await;
            // Nothing writes past the terminal phase; stop taking commands
            // and let buffered ones drain so the registry can drop us
            if self.finished() {
                self.rx.close();
            }
        }
        debug!(project_id = %self.project.id, "Project actor stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Start { reply } => {
                let _ = reply.send(self.start().await);
            }
            Command::Pause { reply } => {
                let _ = reply.send(self.pause().await);
            }
            Command::Advance { reply } => {
                let _ = reply.send(self.advance().await);
            }
            Command::Approve { gate, reply } => {
                let _ = reply.send(self.approve(gate).await);
            }
            Command::Progress { reply } => {
                let _ = reply.send(self.progress().await);
            }
            Command::StepCompleted { run_id } => self.step_completed(run_id).await,
        }
    }

    fn id(&self) -> &str {
        &self.project.id
    }

    fn finished(&self) -> bool {
        self.project.current_phase.is_terminal() && !self.run.is_running
    }

    fn phase_run(&self) -> PhaseRun {
        let phase = self.project.current_phase;
        PhaseRun::new(phase, self.project.is_approved(phase))
    }

    /// Write a new run record; the in-memory copy only changes on success.
    /// If another writer bumped the stored version, reload it and report
    /// `ConflictingRun` so the caller can retry against fresh state.
    async fn commit(&mut self, mut next: RunRecord) -> Result<()> {
        next.updated_at = self.shared.clock.now();
        let expected = self.run.version;
        match self.shared.stores.runs.put_run(next, expected).await {
            Ok(run) => {
                self.run = run;
                Ok(())
            }
            Err(StoreError::VersionConflict { actual, .. }) => {
                warn!(
                    project_id = %self.id(),
                    expected,
                    actual,
                    "Run record changed underneath the actor; reloading"
                );
                if let Some(stored) = self.shared.stores.runs.get_run(self.id()).await? {
                    self.run = stored;
                }
                Err(OrchestrationError::ConflictingRun(self.project.id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn schedule(&self, step: SynthesisStep) {
        let run_id = self.run.run_id;
        let clock = self.shared.clock.clone();
        let delay = self.shared.config.think_time();
        let tx = self.tx.clone();

        debug!(
            project_id = %self.id(),
            run_id,
            artifact = step.artifact_name,
            agent = step.agent_label,
            "Scheduled synthesis step"
        );

        tokio::spawn(async move {
            clock.sleep(delay).await;
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(Command::StepCompleted { run_id }).await;
            }
        });
    }

    async fn start(&mut self) -> Result<StartOutcome> {
        loop {
            let phase = self.project.current_phase;
            let mut next = self.run.clone();
            match self.phase_run().start(&mut next, self.shared.clock.now())? {
                StartStep::Coalesced => {
                    debug!(project_id = %self.id(), "Start coalesced into the active run");
                    return Ok(StartOutcome::AlreadyRunning { phase });
                }
                StartStep::AwaitApproval => {
                    if !self.run.awaiting_approval {
                        self.commit(next).await?;
                    }
                    return Ok(StartOutcome::AwaitingApproval { phase });
                }
                StartStep::Transition => {
                    self.transition().await?;
                    if self.project.current_phase.is_terminal() {
                        return Ok(StartOutcome::Finished);
                    }
                }
                StartStep::Schedule(step) => {
                    self.commit(next).await?;
                    info!(
                        project_id = %self.id(),
                        phase = %phase,
                        run_id = self.run.run_id,
                        step = self.run.next_step,
                        "Synthesis run started"
                    );
                    self.schedule(step);
                    return Ok(StartOutcome::Started {
                        phase,
                        step: self.run.next_step,
                    });
                }
            }
        }
    }

    async fn pause(&mut self) -> Result<()> {
        let mut next = self.run.clone();
        PhaseRun::pause(&mut next)?;
        self.commit(next).await?;
        info!(project_id = %self.id(), run_id = self.run.run_id, "Synthesis run paused");
        Ok(())
    }

    async fn advance(&mut self) -> Result<Project> {
        if self.project.current_phase.is_terminal() {
            return Err(OrchestrationError::AlreadyFinal);
        }
        if self.run.is_running {
            return Err(OrchestrationError::invalid_state(
                "a synthesis run is active; pause it before advancing",
            ));
        }
        self.transition().await
    }

    async fn approve(&mut self, gate: Gate) -> Result<Project> {
        let phase = self.project.current_phase;
        if phase != gate.phase() {
            return Err(OrchestrationError::invalid_state(format!(
                "{gate} approval is only valid during the {} phase (current: {phase})",
                gate.phase()
            )));
        }
        if self.project.is_approved(phase) {
            return Ok(self.project.clone());
        }

        let mut project = self.project.clone();
        match gate {
            Gate::Stack => project.stack_approved = true,
            Gate::Dependencies => project.dependencies_approved = true,
        }
        project.updated_at = self.shared.clock.now();
        self.shared.stores.projects.update_project(project.clone()).await?;
        self.project = project;

        info!(project_id = %self.id(), gate = %gate, "Gate approved");
        Ok(self.project.clone())
    }

    async fn progress(&self) -> Result<Progress> {
        let history = self.shared.stores.projects.phase_history(self.id()).await?;
        Ok(Progress::compute(
            &self.project,
            &self.run,
            history,
            self.shared.config.think_time(),
        ))
    }

    async fn step_completed(&mut self, run_id: u64) {
        let step = match self.phase_run().step_completed(&self.run, run_id) {
            StepOutcome::Stale => {
                debug!(
                    project_id = %self.id(),
                    run_id,
                    current_run_id = self.run.run_id,
                    "Discarded stale step completion"
                );
                return;
            }
            StepOutcome::Synthesize(step) => step,
        };

        if let Err(e) = self.complete_step(step).await {
            self.abort(e).await;
        }
    }

    async fn complete_step(&mut self, step: SynthesisStep) -> Result<()> {
        self.synthesize(step).await?;

        let fsm = self.phase_run();
        let mut next = self.run.clone();
        match fsm.after_persist(&mut next) {
            AfterStep::Schedule(step) => {
                self.commit(next).await?;
                self.schedule(step);
            }
            AfterStep::Halt => {
                self.commit(next).await?;
                info!(
                    project_id = %self.id(),
                    phase = %fsm.phase,
                    "Phase synthesized; awaiting approval"
                );
                self.inspect_gate(fsm.phase).await;
            }
            AfterStep::Transition => {
                self.commit(next).await?;
                self.transition().await?;

                let mut next = self.run.clone();
                match self.phase_run().continue_run(&mut next) {
                    Some(step) => {
                        self.commit(next).await?;
                        self.schedule(step);
                    }
                    None => {
                        self.commit(next).await?;
                        info!(project_id = %self.id(), "All phases synthesized");
                    }
                }
            }
        }
        Ok(())
    }

    async fn synthesize(&self, step: SynthesisStep) -> Result<Artifact> {
        let artifact = Artifact::new(
            self.id(),
            self.project.current_phase,
            step.artifact_name,
            templates::render(step.artifact_name, &self.project),
        )
        .with_agent(step.agent_label)
        .with_quality(quality_score(self.id(), step.artifact_name))
        .with_status(ArtifactStatus::Pass)
        .with_created_at(self.shared.clock.now());

        let stored = self.shared.stores.artifacts.insert_artifact(artifact).await?;
        info!(
            project_id = %self.id(),
            phase = %stored.phase,
            artifact = %stored.artifact_name,
            version = stored.version,
            agent = %stored.agent_label,
            "Artifact synthesized"
        );
        Ok(stored)
    }

    async fn abort(&mut self, err: OrchestrationError) {
        error!(
            project_id = %self.id(),
            phase = %self.project.current_phase,
            error = %err,
            "Synthesis run aborted"
        );
        let message = err.to_string();
        let mut next = self.run.clone();
        PhaseRun::abort(&mut next, message.clone());
        if let Err(e) = self.commit(next).await {
            warn!(project_id = %self.id(), error = %e, "Failed to persist aborted run");
            PhaseRun::abort(&mut self.run, message);
        }
    }

    /// Move to the next phase: reset run bookkeeping, complete the exited
    /// phase, record history. A failed write puts the prior phase and run
    /// record back, so a retry repeats the same transition.
    async fn transition(&mut self) -> Result<Project> {
        let from = self.project.current_phase;
        let to = from.next().ok_or(OrchestrationError::AlreadyFinal)?;
        let now = self.shared.clock.now();

        let artifacts_generated = self.phase_artifact_names(from).await?;
        let validation_passed = self.validation_passed(from).await?;

        let prior_project = self.project.clone();
        let prior_run = self.run.clone();

        let mut next = self.run.clone();
        next.reset_for_phase();
        self.commit(next).await?;

        let mut project = self.project.clone();
        if !project.phases_completed.contains(&from) {
            project.phases_completed.push(from);
        }
        project.current_phase = to;
        project.updated_at = now;
        project.orchestration_state = json!({
            "lastTransition": { "from": from, "to": to, "at": now },
            "runId": self.run.run_id,
        });
        let entry = PhaseHistoryEntry {
            project_id: project.id.clone(),
            from_phase: Some(from),
            to_phase: to,
            artifacts_generated,
            validation_passed,
            timestamp: now,
        };

        if let Err(e) = self.record_transition(project, entry).await {
            warn!(
                project_id = %self.id(),
                from = %from,
                to = %to,
                error = %e,
                "Phase transition failed; restoring prior state"
            );
            self.restore(prior_project, prior_run).await;
            return Err(e);
        }

        info!(
            project_id = %self.id(),
            from = %from,
            to = %to,
            validation_passed,
            "Phase transition"
        );
        Ok(self.project.clone())
    }

    async fn record_transition(&mut self, project: Project, entry: PhaseHistoryEntry) -> Result<()> {
        self.shared.stores.projects.update_project(project.clone()).await?;
        self.project = project;
        self.shared.stores.projects.append_history(entry).await?;
        Ok(())
    }

    /// Best effort: failures are logged and the in-memory copies still roll
    /// back, so this actor keeps serving the prior phase
    async fn restore(&mut self, project: Project, run: RunRecord) {
        if self.project != project {
            if let Err(e) = self.shared.stores.projects.update_project(project.clone()).await {
                warn!(project_id = %self.id(), error = %e, "Failed to restore project phase");
            }
            self.project = project;
        }

        let restored = RunRecord {
            version: self.run.version,
            ..run
        };
        if let Err(e) = self.commit(restored.clone()).await {
            warn!(project_id = %self.id(), error = %e, "Failed to restore run record");
            // A conflict already reloaded the stored record
            if self.run.version == restored.version {
                self.run = restored;
            }
        }
    }

    async fn phase_artifact_names(&self, phase: Phase) -> Result<Vec<String>> {
        let artifacts = self.shared.stores.artifacts.list_artifacts(self.id()).await?;
        let mut names: Vec<String> = Vec::new();
        for artifact in artifacts.into_iter().filter(|a| a.phase == phase) {
            if !names.contains(&artifact.artifact_name) {
                names.push(artifact.artifact_name);
            }
        }
        Ok(names)
    }

    /// Latest report for the phase is not `fail`; true when there is none
    async fn validation_passed(&self, phase: Phase) -> Result<bool> {
        let reports = self
            .shared
            .stores
            .reports
            .list_reports(self.id(), usize::MAX)
            .await?;
        Ok(reports
            .iter()
            .find(|r| r.phase == phase)
            .map_or(true, |r| r.overall_status != ReportStatus::Fail))
    }

    /// Validation and traceability verdicts for a halted gate. Logged and
    /// stored, never blocking.
    async fn inspect_gate(&self, phase: Phase) {
        if !self.shared.config.auto_inspect_gates {
            return;
        }

        if let Some(validation) = &self.shared.validation {
            match validation.validate_project(self.id(), phase).await {
                Ok(report) => info!(
                    project_id = %self.id(),
                    phase = %phase,
                    report_id = %report.id,
                    status = %report.overall_status,
                    failed = report.failed_rules,
                    warnings = report.warning_rules,
                    "Gate validation recorded"
                ),
                Err(e) => warn!(project_id = %self.id(), error = %e, "Gate validation failed"),
            }
        }

        match self.shared.stores.artifacts.list_artifacts(self.id()).await {
            Ok(artifacts) => {
                let set = ArtifactSet::from_artifacts(&artifacts);
                let matrix = self
                    .shared
                    .traceability
                    .generate_traceability_matrix(self.id(), &set);
                info!(
                    project_id = %self.id(),
                    phase = %phase,
                    requirements = matrix.total_requirements,
                    overall_coverage = matrix.overall_coverage,
                    uncovered = matrix.uncovered_count,
                    "Gate traceability computed"
                );
            }
            Err(e) => warn!(project_id = %self.id(), error = %e, "Gate traceability skipped"),
        }
    }
}
