//! Orchestrator handle and actor registry

use specflow_core::config::OrchestratorConfig;
use specflow_core::{
    Artifact, Clock, OrchestrationError, Phase, PhaseHistoryEntry, Project, Result, RunRecord,
    StoreHandles,
};
use specflow_traceability::TraceabilityEngine;
use specflow_validation::ValidationService;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, instrument};

use crate::actor::{Command, Gate, ProjectActor};
use crate::progress::{Progress, StartOutcome};

/// State shared by every project actor
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) stores: StoreHandles,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: OrchestratorConfig,
    pub(crate) validation: Option<ValidationService>,
    pub(crate) traceability: TraceabilityEngine,
}

/// Entry point for phase orchestration. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    shared: Arc<Shared>,
    actors: Arc<Mutex<HashMap<String, mpsc::Sender<Command>>>>,
}

impl Orchestrator {
    /// `validation` enables gate inspection; without it halts are only logged
    pub fn new(
        stores: StoreHandles,
        clock: Arc<dyn Clock>,
        config: OrchestratorConfig,
        validation: Option<ValidationService>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                stores,
                clock,
                config,
                validation,
                traceability: TraceabilityEngine::new(),
            }),
            actors: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn stores(&self) -> &StoreHandles {
        &self.shared.stores
    }

    /// Seed a project in the analysis phase
    #[instrument(skip(self, description, idea))]
    pub async fn create_project(&self, name: &str, description: &str, idea: &str) -> Result<Project> {
        let name = name.trim();
        if name.is_empty() {
            return Err(OrchestrationError::invalid_state("project name must not be empty"));
        }

        let now = self.shared.clock.now();
        let mut project = Project::new(name, description, idea);
        project.created_at = now;
        project.updated_at = now;

        self.shared.stores.projects.insert_project(project.clone()).await?;
        self.shared
            .stores
            .projects
            .append_history(PhaseHistoryEntry {
                project_id: project.id.clone(),
                from_phase: None,
                to_phase: Phase::Analysis,
                artifacts_generated: Vec::new(),
                validation_passed: true,
                timestamp: now,
            })
            .await?;

        info!(project_id = %project.id, slug = %project.slug, "Project created");
        Ok(project)
    }

    pub async fn get_project(&self, project_id: &str) -> Result<Project> {
        self.shared
            .stores
            .projects
            .get_project(project_id)
            .await?
            .ok_or_else(|| OrchestrationError::NotFound(project_id.to_string()))
    }

    /// Every stored artifact version, in insertion order
    pub async fn artifacts(&self, project_id: &str) -> Result<Vec<Artifact>> {
        self.get_project(project_id).await?;
        Ok(self.shared.stores.artifacts.list_artifacts(project_id).await?)
    }

    pub async fn history(&self, project_id: &str) -> Result<Vec<PhaseHistoryEntry>> {
        self.get_project(project_id).await?;
        Ok(self.shared.stores.projects.phase_history(project_id).await?)
    }

    pub async fn start(&self, project_id: &str) -> Result<StartOutcome> {
        self.request(project_id, |reply| Command::Start { reply }).await
    }

    pub async fn pause(&self, project_id: &str) -> Result<()> {
        self.request(project_id, |reply| Command::Pause { reply }).await
    }

    pub async fn advance(&self, project_id: &str) -> Result<Project> {
        self.request(project_id, |reply| Command::Advance { reply }).await
    }

    pub async fn approve_stack(&self, project_id: &str) -> Result<Project> {
        self.approve(project_id, Gate::Stack).await
    }

    pub async fn approve_dependencies(&self, project_id: &str) -> Result<Project> {
        self.approve(project_id, Gate::Dependencies).await
    }

    async fn approve(&self, project_id: &str, gate: Gate) -> Result<Project> {
        self.request(project_id, |reply| Command::Approve { gate, reply })
            .await
    }

    pub async fn progress(&self, project_id: &str) -> Result<Progress> {
        self.request(project_id, |reply| Command::Progress { reply })
            .await
    }

    /// Number of live project actors. Actors of finished projects stop on
    /// their own and are pruned here.
    pub async fn active_actors(&self) -> usize {
        let mut actors = self.actors.lock().await;
        actors.retain(|_, tx| !tx.is_closed());
        actors.len()
    }

    async fn request<T>(
        &self,
        project_id: &str,
        command: impl FnOnce(oneshot::Sender<Result<T>>) -> Command,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        let mut command = command(reply);

        // An actor that stopped between lookup and send hands the command
        // back; a fresh actor gets it
        let mut delivered = false;
        for _ in 0..2 {
            let actor = self.actor(project_id).await?;
            match actor.send(command).await {
                Ok(()) => {
                    delivered = true;
                    break;
                }
                Err(mpsc::error::SendError(returned)) => command = returned,
            }
        }
        if !delivered {
            return Err(OrchestrationError::Unavailable(format!("actor for {project_id} stopped")));
        }

        rx.await
            .map_err(|_| OrchestrationError::Unavailable(format!("actor for {project_id} dropped the request")))?
    }

    /// Sender for the project's actor, spawning it on first use. Store reads
    /// happen outside the registry lock.
    async fn actor(&self, project_id: &str) -> Result<mpsc::Sender<Command>> {
        let seen_stopped = {
            let actors = self.actors.lock().await;
            match actors.get(project_id) {
                Some(tx) if !tx.is_closed() => return Ok(tx.clone()),
                Some(_) => true,
                None => false,
            }
        };

        let (mut project, mut run) = self.load(project_id).await?;

        let mut actors = self.actors.lock().await;
        match actors.get(project_id) {
            Some(tx) if !tx.is_closed() => return Ok(tx.clone()),
            // An actor came and went while we were loading; its writes are newer
            Some(_) if !seen_stopped => (project, run) = self.load(project_id).await?,
            _ => {}
        }
        actors.retain(|_, tx| !tx.is_closed());

        debug!(project_id = %project_id, run_version = run.version, "Spawning project actor");
        let tx = ProjectActor::spawn(project, run, self.shared.clone());
        actors.insert(project_id.to_string(), tx.clone());
        Ok(tx)
    }

    async fn load(&self, project_id: &str) -> Result<(Project, RunRecord)> {
        let project = self.get_project(project_id).await?;
        let run = match self.shared.stores.runs.get_run(project_id).await? {
            Some(run) => run,
            None => RunRecord::new(project_id, self.shared.clock.now()),
        };
        Ok((project, run))
    }
}
