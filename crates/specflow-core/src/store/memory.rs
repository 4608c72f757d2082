//! In-memory store of record
//!
//! One `RwLock` per table. Every write completes before the lock is released,
//! which gives read-your-writes consistency to all callers in the process.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ArtifactStore, ProjectStore, ReportStore, RunStore, StoreResult};
use crate::error::StoreError;
use crate::model::{
    Artifact, ArtifactStatus, PhaseHistoryEntry, Project, RunRecord, ValidationReport,
};
use crate::rules::ValidationRule;

/// Process-local backend for all store interfaces
#[derive(Debug, Default)]
pub struct MemoryStore {
    projects: RwLock<HashMap<String, Project>>,
    history: RwLock<HashMap<String, Vec<PhaseHistoryEntry>>>,
    artifacts: RwLock<Vec<Artifact>>,
    runs: RwLock<HashMap<String, RunRecord>>,
    reports: RwLock<Vec<ValidationReport>>,
    rules: RwLock<Vec<ValidationRule>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn insert_project(&self, project: Project) -> StoreResult<()> {
        let mut projects = self.projects.write().await;
        if projects.contains_key(&project.id) {
            return Err(StoreError::Conflict(format!(
                "project '{}' already exists",
                project.id
            )));
        }
        projects.insert(project.id.clone(), project);
        Ok(())
    }

    async fn get_project(&self, id: &str) -> StoreResult<Option<Project>> {
        Ok(self.projects.read().await.get(id).cloned())
    }

    async fn update_project(&self, project: Project) -> StoreResult<()> {
        let mut projects = self.projects.write().await;
        match projects.get_mut(&project.id) {
            Some(slot) => {
                *slot = project;
                Ok(())
            }
            None => Err(StoreError::not_found("project", project.id)),
        }
    }

    async fn append_history(&self, entry: PhaseHistoryEntry) -> StoreResult<()> {
        self.history
            .write()
            .await
            .entry(entry.project_id.clone())
            .or_default()
            .push(entry);
        Ok(())
    }

    async fn phase_history(&self, project_id: &str) -> StoreResult<Vec<PhaseHistoryEntry>> {
        Ok(self
            .history
            .read()
            .await
            .get(project_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn insert_artifact(&self, mut artifact: Artifact) -> StoreResult<Artifact> {
        let mut artifacts = self.artifacts.write().await;
        let earlier = artifacts
            .iter()
            .filter(|a| {
                a.project_id == artifact.project_id && a.artifact_name == artifact.artifact_name
            })
            .count();
        artifact.version = earlier as u32 + 1;
        artifacts.push(artifact.clone());
        Ok(artifact)
    }

    async fn list_artifacts(&self, project_id: &str) -> StoreResult<Vec<Artifact>> {
        Ok(self
            .artifacts
            .read()
            .await
            .iter()
            .filter(|a| a.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn set_validation_status(
        &self,
        artifact_id: Uuid,
        status: ArtifactStatus,
    ) -> StoreResult<()> {
        let mut artifacts = self.artifacts.write().await;
        let artifact = artifacts
            .iter_mut()
            .find(|a| a.id == artifact_id)
            .ok_or_else(|| StoreError::not_found("artifact", artifact_id.to_string()))?;
        artifact.validation_status = status;
        Ok(())
    }
}

#[async_trait]
impl RunStore for MemoryStore {
    async fn get_run(&self, project_id: &str) -> StoreResult<Option<RunRecord>> {
        Ok(self.runs.read().await.get(project_id).cloned())
    }

    async fn put_run(&self, mut record: RunRecord, expected_version: u64) -> StoreResult<RunRecord> {
        let mut runs = self.runs.write().await;
        let actual = runs.get(&record.project_id).map(|r| r.version).unwrap_or(0);
        if actual != expected_version {
            return Err(StoreError::VersionConflict {
                id: record.project_id,
                expected: expected_version,
                actual,
            });
        }
        record.version = actual + 1;
        runs.insert(record.project_id.clone(), record.clone());
        Ok(record)
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn save_report(&self, report: ValidationReport) -> StoreResult<()> {
        self.reports.write().await.push(report);
        Ok(())
    }

    async fn get_report(&self, id: Uuid) -> StoreResult<Option<ValidationReport>> {
        Ok(self
            .reports
            .read()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn list_reports(
        &self,
        project_id: &str,
        limit: usize,
    ) -> StoreResult<Vec<ValidationReport>> {
        // Insertion order is creation order
        Ok(self
            .reports
            .read()
            .await
            .iter()
            .rev()
            .filter(|r| r.project_id == project_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn save_rule(&self, rule: ValidationRule) -> StoreResult<()> {
        let mut rules = self.rules.write().await;
        match rules.iter_mut().find(|r| r.id == rule.id) {
            Some(slot) => *slot = rule,
            None => rules.push(rule),
        }
        Ok(())
    }

    async fn list_rules(&self) -> StoreResult<Vec<ValidationRule>> {
        Ok(self.rules.read().await.clone())
    }
}
