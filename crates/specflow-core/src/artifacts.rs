//! Named artifact sets and role lookup
//!
//! Rules and the traceability engine address documents by role (the
//! requirements document, the API spec, ...) rather than by exact file name.
//! A role resolves to its canonical name first, then to the first name in
//! sorted order containing one of the role's keywords.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::model::Artifact;

/// The part a document plays in cross-artifact checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactRole {
    Requirements,
    ApiSpec,
    DataModel,
    Tasks,
    StackProposal,
    DependencyManifest,
}

impl ArtifactRole {
    pub const ALL: [ArtifactRole; 6] = [
        ArtifactRole::Requirements,
        ArtifactRole::ApiSpec,
        ArtifactRole::DataModel,
        ArtifactRole::Tasks,
        ArtifactRole::StackProposal,
        ArtifactRole::DependencyManifest,
    ];

    /// Name the synthesis pipeline gives this document
    pub fn canonical_name(self) -> &'static str {
        match self {
            ArtifactRole::Requirements => "requirements.md",
            ArtifactRole::ApiSpec => "api_spec.json",
            ArtifactRole::DataModel => "data_model.md",
            ArtifactRole::Tasks => "tasks.md",
            ArtifactRole::StackProposal => "stack_proposal.md",
            ArtifactRole::DependencyManifest => "dependencies.json",
        }
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            ArtifactRole::Requirements => &["requirement", "prd"],
            ArtifactRole::ApiSpec => &["openapi", "api_spec", "api-spec", "apispec"],
            ArtifactRole::DataModel => &["data_model", "data-model", "datamodel", "schema", "erd"],
            ArtifactRole::Tasks => &["task", "stories", "backlog"],
            ArtifactRole::StackProposal => &["stack"],
            ArtifactRole::DependencyManifest => &["dependenc", "manifest"],
        }
    }

    /// Whether an artifact name plausibly plays this role
    pub fn matches(self, name: &str) -> bool {
        let lower = name.to_lowercase();
        lower == self.canonical_name() || self.keywords().iter().any(|k| lower.contains(k))
    }
}

/// Highest version of each named artifact, in name order. Equal versions
/// resolve to the later row.
pub fn latest_versions<'a>(artifacts: impl IntoIterator<Item = &'a Artifact>) -> Vec<&'a Artifact> {
    let mut latest: BTreeMap<&str, &Artifact> = BTreeMap::new();
    for artifact in artifacts {
        let newer = latest
            .get(artifact.artifact_name.as_str())
            .map_or(true, |seen| artifact.version >= seen.version);
        if newer {
            latest.insert(artifact.artifact_name.as_str(), artifact);
        }
    }
    latest.into_values().collect()
}

/// Artifact contents keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactSet {
    by_name: BTreeMap<String, String>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest version of each named artifact
    pub fn from_artifacts<'a>(artifacts: impl IntoIterator<Item = &'a Artifact>) -> Self {
        Self {
            by_name: latest_versions(artifacts)
                .into_iter()
                .map(|a| (a.artifact_name.clone(), a.content.clone()))
                .collect(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.by_name.insert(name.into(), content.into());
    }

    pub fn with(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(name, content);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    /// Resolve a role to `(name, content)`
    pub fn role(&self, role: ArtifactRole) -> Option<(&str, &str)> {
        if let Some((name, content)) = self.by_name.get_key_value(role.canonical_name()) {
            return Some((name.as_str(), content.as_str()));
        }
        self.by_name
            .iter()
            .find(|(name, _)| role.matches(name))
            .map(|(name, content)| (name.as_str(), content.as_str()))
    }

    /// Content of a role, treating blank documents as absent
    pub fn role_content(&self, role: ArtifactRole) -> Option<&str> {
        self.role(role)
            .map(|(_, content)| content)
            .filter(|content| !content.trim().is_empty())
    }

    pub fn names(&self) -> Vec<String> {
        self.by_name.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// SHA-256 hex over the sorted `(name, content)` pairs
    pub fn inputs_hash(&self) -> String {
        let mut hasher = Sha256::new();
        for (name, content) in &self.by_name {
            hasher.update(name.as_bytes());
            hasher.update([0u8]);
            hasher.update(content.as_bytes());
            hasher.update([0u8]);
        }
        hex::encode(hasher.finalize())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ArtifactSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            by_name: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
