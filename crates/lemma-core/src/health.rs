//! Health diagnosis: is the proof making progress, and if not, why?

use crate::config::ChallengeConfig;
use crate::jobs::{self, JobBoard};
use crate::model::node::EpistemicState;
use crate::model::node_id::NodeId;
use crate::projection::State;
use serde::Serialize;
use std::fmt;

/// Overall verdict, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Stuck,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Stuck => "stuck",
        })
    }
}

/// Typed causes for a non-healthy verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockerKind {
    /// Every pending leaf carries at least one open challenge.
    AllLeavesChallenged,
    /// Pending nodes exist but neither role has any actionable job.
    NoAvailableJobs,
    /// More than half of the pending leaves are challenged.
    HighBlockedRatio,
}

/// One causal blocker with remediation guidance.
#[derive(Debug, Clone, Serialize)]
pub struct Blocker {
    pub kind: BlockerKind,
    pub message: String,
    pub suggestion: String,
    /// Nodes the blocker points at, in id order.
    pub node_ids: Vec<NodeId>,
}

/// Counts by epistemic state plus derived figures.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Stats {
    pub pending: usize,
    pub validated: usize,
    pub admitted: usize,
    pub refuted: usize,
    pub archived: usize,
    pub needs_refinement: usize,
    pub leaf_count: usize,
    pub open_challenge_count: usize,
    pub blocked_leaf_count: usize,
    pub prover_job_count: usize,
    pub verifier_job_count: usize,
}

/// The full diagnosis.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    /// Blockers in rule order; the first one determined the status.
    pub blockers: Vec<Blocker>,
    pub stats: Stats,
}

/// Classify the proof as healthy, warning, or stuck.
///
/// Rules, first match setting the status:
///
/// 1. `stuck` when pending leaves exist and every one carries an open
///    challenge.
/// 2. `warning` when pending nodes exist but both job lists are empty.
/// 3. `warning` when more than half (but not all) of the pending leaves are
///    challenged.
#[must_use]
pub fn diagnose(state: &State, policy: &ChallengeConfig) -> HealthReport {
    let board = jobs::find_jobs(state, policy);
    let stats = collect_stats(state, &board);

    let pending_leaves: Vec<&NodeId> = state
        .leaves()
        .iter()
        .filter(|node| node.epistemic == EpistemicState::Pending)
        .map(|node| &node.id)
        .collect();
    let blocked_leaves: Vec<NodeId> = pending_leaves
        .iter()
        .filter(|id| !state.open_challenges_for(id).is_empty())
        .map(|id| (*id).clone())
        .collect();

    let mut blockers = Vec::new();

    if !pending_leaves.is_empty() && blocked_leaves.len() == pending_leaves.len() {
        blockers.push(Blocker {
            kind: BlockerKind::AllLeavesChallenged,
            message: format!(
                "all {} pending leaves carry open challenges",
                pending_leaves.len()
            ),
            suggestion: "Provers should answer the challenges, or verifiers withdraw stale ones."
                .into(),
            node_ids: blocked_leaves.clone(),
        });
    }

    let pending_nodes = stats.pending + stats.needs_refinement;
    if pending_nodes > 0 && board.prover_jobs.is_empty() && board.verifier_jobs.is_empty() {
        blockers.push(Blocker {
            kind: BlockerKind::NoAvailableJobs,
            message: format!("{pending_nodes} unresolved nodes but no actionable jobs"),
            suggestion: "Check for expired claims holding nodes; run `lm reap`.".into(),
            node_ids: Vec::new(),
        });
    }

    if !blocked_leaves.is_empty()
        && blocked_leaves.len() < pending_leaves.len()
        && blocked_leaves.len() * 2 > pending_leaves.len()
    {
        blockers.push(Blocker {
            kind: BlockerKind::HighBlockedRatio,
            message: format!(
                "{} of {} pending leaves carry open challenges",
                blocked_leaves.len(),
                pending_leaves.len()
            ),
            suggestion: "Prioritize answering challenges before opening new branches.".into(),
            node_ids: blocked_leaves,
        });
    }

    let status = match blockers.first().map(|b| b.kind) {
        Some(BlockerKind::AllLeavesChallenged) => HealthStatus::Stuck,
        Some(BlockerKind::NoAvailableJobs | BlockerKind::HighBlockedRatio) => {
            HealthStatus::Warning
        }
        None => HealthStatus::Healthy,
    };

    HealthReport {
        status,
        blockers,
        stats,
    }
}

fn collect_stats(state: &State, board: &JobBoard) -> Stats {
    let mut stats = Stats {
        prover_job_count: board.prover_jobs.len(),
        verifier_job_count: board.verifier_jobs.len(),
        open_challenge_count: state.open_challenges().len(),
        ..Stats::default()
    };
    for node in state.nodes() {
        match node.epistemic {
            EpistemicState::Pending => stats.pending += 1,
            EpistemicState::Validated => stats.validated += 1,
            EpistemicState::Admitted => stats.admitted += 1,
            EpistemicState::Refuted => stats.refuted += 1,
            EpistemicState::Archived => stats.archived += 1,
            EpistemicState::NeedsRefinement => stats.needs_refinement += 1,
        }
    }
    for node in state.leaves() {
        stats.leaf_count += 1;
        if node.epistemic == EpistemicState::Pending
            && !state.open_challenges_for(&node.id).is_empty()
        {
            stats.blocked_leaf_count += 1;
        }
    }
    stats
}
