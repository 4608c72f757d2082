//! Synthesis plans: which artifacts each phase produces, and by whom

use sha2::{Digest, Sha256};
use specflow_core::Phase;

/// One artifact to synthesize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisStep {
    pub artifact_name: &'static str,
    pub agent_label: &'static str,
}

const fn step(artifact_name: &'static str, agent_label: &'static str) -> SynthesisStep {
    SynthesisStep {
        artifact_name,
        agent_label,
    }
}

const ANALYSIS: &[SynthesisStep] = &[
    step("project_brief.md", "Business Analyst"),
    step("requirements.md", "Requirements Engineer"),
];
const STACK_SELECTION: &[SynthesisStep] = &[step("stack_proposal.md", "Solution Architect")];
const SPEC: &[SynthesisStep] = &[
    step("api_spec.json", "API Designer"),
    step("data_model.md", "Data Architect"),
    step("architecture.md", "Solution Architect"),
];
const DEPENDENCIES: &[SynthesisStep] = &[step("dependencies.json", "Dependency Analyst")];
const SOLUTIONING: &[SynthesisStep] = &[step("tasks.md", "Delivery Planner")];

/// Ordered steps of a phase; empty for the terminal phase
pub fn plan(phase: Phase) -> &'static [SynthesisStep] {
    match phase {
        Phase::Analysis => ANALYSIS,
        Phase::StackSelection => STACK_SELECTION,
        Phase::Spec => SPEC,
        Phase::Dependencies => DEPENDENCIES,
        Phase::Solutioning => SOLUTIONING,
        Phase::Done => &[],
    }
}

/// Steps left from `next_step` in `phase` through the end of the sequence
pub fn remaining_steps(phase: Phase, next_step: usize) -> usize {
    let current = plan(phase).len().saturating_sub(next_step);
    let later: usize = Phase::SEQUENCE[phase.index() + 1..]
        .iter()
        .map(|p| plan(*p).len())
        .sum();
    current + later
}

/// Deterministic stand-in quality score in `80..=100`
pub fn quality_score(project_id: &str, artifact_name: &str) -> u8 {
    let mut hasher = Sha256::new();
    hasher.update(project_id.as_bytes());
    hasher.update(b":");
    hasher.update(artifact_name.as_bytes());
    let digest = hasher.finalize();
    80 + digest[0] % 21
}
