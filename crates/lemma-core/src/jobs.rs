//! Job scheduling: what should each role work on right now?
//!
//! Pure and single-pass over the projection. Identical state yields
//! identical output, so front-ends can call this freely.

use crate::config::ChallengeConfig;
use crate::model::node::{EpistemicState, WorkflowState};
use crate::model::node_id::NodeId;
use crate::projection::State;
use serde::Serialize;

/// What a prover should do at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProverAction {
    /// Break the claim into sub-claims (or tighten the statement).
    Refine,
    /// Address the open challenges before anything else.
    AnswerChallenges,
}

/// One actionable work item for a prover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProverJob {
    pub node_id: NodeId,
    pub action: ProverAction,
    /// Open challenges against the node.
    pub open_challenges: usize,
    /// Open challenges whose target blocks acceptance.
    pub blocking_challenges: usize,
}

/// What a verifier should do at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifierAction {
    /// Inspect a pending claim and accept, admit, refute, or challenge it.
    Review,
    /// Re-inspect an already-validated claim (lower priority).
    Audit,
}

/// One actionable work item for a verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifierJob {
    pub node_id: NodeId,
    pub action: VerifierAction,
}

/// The scheduler output: ordered prover and verifier work lists.
#[derive(Debug, Clone, Serialize)]
pub struct JobBoard {
    pub prover_jobs: Vec<ProverJob>,
    pub verifier_jobs: Vec<VerifierJob>,
}

/// Enumerate actionable work items from the projection.
///
/// Prover jobs: available nodes in `pending`/`needs_refinement` that are
/// leaves or carry open challenges. Nodes with open *blocking* challenges
/// sort first; within each group the order is node-id order.
///
/// Verifier jobs: available pending nodes with no open challenges (review),
/// followed by validated unchallenged nodes an auditor could re-inspect.
#[must_use]
pub fn find_jobs(state: &State, policy: &ChallengeConfig) -> JobBoard {
    let mut prover_jobs = Vec::new();
    let mut reviews = Vec::new();
    let mut audits = Vec::new();

    for node in state.nodes() {
        let open = state.open_challenges_for(&node.id);
        let blocking = open
            .iter()
            .filter(|ch| policy.is_blocking(ch.target))
            .count();

        let available = node.workflow == WorkflowState::Available;
        let prover_state = matches!(
            node.epistemic,
            EpistemicState::Pending | EpistemicState::NeedsRefinement
        );
        if available && prover_state && (state.is_leaf(&node.id) || !open.is_empty()) {
            prover_jobs.push(ProverJob {
                node_id: node.id.clone(),
                action: if open.is_empty() {
                    ProverAction::Refine
                } else {
                    ProverAction::AnswerChallenges
                },
                open_challenges: open.len(),
                blocking_challenges: blocking,
            });
        }

        if available && node.epistemic == EpistemicState::Pending && open.is_empty() {
            reviews.push(VerifierJob {
                node_id: node.id.clone(),
                action: VerifierAction::Review,
            });
        } else if node.epistemic == EpistemicState::Validated && open.is_empty() {
            audits.push(VerifierJob {
                node_id: node.id.clone(),
                action: VerifierAction::Audit,
            });
        }
    }

    // Nodes walk in id order already; only the blocked-first split reorders.
    prover_jobs.sort_by(|a, b| {
        let a_blocked = a.blocking_challenges > 0;
        let b_blocked = b.blocking_challenges > 0;
        b_blocked
            .cmp(&a_blocked)
            .then_with(|| a.node_id.cmp(&b.node_id))
    });

    let mut verifier_jobs = reviews;
    verifier_jobs.extend(audits);

    JobBoard {
        prover_jobs,
        verifier_jobs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Event, EventPayload};
    use crate::model::challenge::ChallengeTarget;
    use crate::model::node::{Inference, NodeKind};
    use chrono::Utc;

    fn nid(s: &str) -> NodeId {
        s.parse().expect("valid id")
    }

    struct Builder {
        events: Vec<Event>,
    }

    impl Builder {
        fn new() -> Self {
            Self {
                events: vec![Event {
                    seq: 1,
                    timestamp: Utc::now(),
                    payload: EventPayload::ProofInitialized {
                        conjecture: "C".into(),
                        author: "a".into(),
                        created_at: Utc::now(),
                    },
                }],
            }
        }

        fn push(mut self, payload: EventPayload) -> Self {
            let seq = self.events.len() as u64 + 1;
            self.events.push(Event {
                seq,
                timestamp: Utc::now(),
                payload,
            });
            self
        }

        fn node(self, id: &str) -> Self {
            let node_id = nid(id);
            let parent = node_id.parent().expect("non-root");
            self.push(EventPayload::NodeCreated {
                node_id,
                kind: NodeKind::Claim,
                statement: id.to_string(),
                inference: Inference::Assumption,
                parent,
            })
        }

        fn validated(self, id: &str) -> Self {
            self.push(EventPayload::NodeValidated { node_id: nid(id) })
        }

        fn challenged(self, ch: &str, id: &str, target: ChallengeTarget) -> Self {
            self.push(EventPayload::ChallengeRaised {
                challenge_id: ch.into(),
                node_id: nid(id),
                target,
                reason: "r".into(),
                raised_by: None,
            })
        }

        fn claimed(self, id: &str, owner: &str) -> Self {
            self.push(EventPayload::NodesClaimed {
                node_ids: vec![nid(id)],
                owner: owner.into(),
                timeout_secs: 3600,
                acquired_at: Utc::now(),
            })
        }

        fn state(self) -> State {
            State::replay_events(&self.events).expect("replay")
        }
    }

    fn policy() -> ChallengeConfig {
        ChallengeConfig::default()
    }

    #[test]
    fn pending_leaves_are_prover_and_verifier_jobs() {
        let state = Builder::new().validated("1").node("1.1").node("1.2").state();
        let board = find_jobs(&state, &policy());

        let prover_ids: Vec<String> = board
            .prover_jobs
            .iter()
            .map(|j| j.node_id.to_string())
            .collect();
        assert_eq!(prover_ids, ["1.1", "1.2"]);
        assert!(board
            .prover_jobs
            .iter()
            .all(|j| j.action == ProverAction::Refine));

        let verifier_ids: Vec<String> = board
            .verifier_jobs
            .iter()
            .map(|j| j.node_id.to_string())
            .collect();
        assert_eq!(verifier_ids, ["1.1", "1.2"]);
    }

    #[test]
    fn claimed_nodes_are_excluded() {
        let state = Builder::new()
            .validated("1")
            .node("1.1")
            .claimed("1.1", "prover-a")
            .state();
        let board = find_jobs(&state, &policy());
        assert!(board.prover_jobs.is_empty());
        assert!(board.verifier_jobs.is_empty());
    }

    #[test]
    fn challenged_node_is_prover_work_not_verifier_work() {
        let state = Builder::new()
            .validated("1")
            .node("1.1")
            .challenged("ch-1", "1.1", ChallengeTarget::Statement)
            .state();
        let board = find_jobs(&state, &policy());

        assert_eq!(board.prover_jobs.len(), 1);
        assert_eq!(board.prover_jobs[0].action, ProverAction::AnswerChallenges);
        assert_eq!(board.prover_jobs[0].blocking_challenges, 1);
        assert!(board.verifier_jobs.is_empty());
    }

    #[test]
    fn challenged_interior_node_is_still_prover_work() {
        // Not a leaf, but the open challenge makes prover action productive.
        let state = Builder::new()
            .node("1.1")
            .challenged("ch-1", "1", ChallengeTarget::Gap)
            .state();
        let board = find_jobs(&state, &policy());
        assert!(board
            .prover_jobs
            .iter()
            .any(|j| j.node_id == NodeId::root()));
    }

    #[test]
    fn blocking_challenges_sort_first() {
        let state = Builder::new()
            .validated("1")
            .node("1.1")
            .node("1.2")
            .challenged("ch-1", "1.2", ChallengeTarget::Inference)
            .state();
        let board = find_jobs(&state, &policy());
        let ids: Vec<String> = board
            .prover_jobs
            .iter()
            .map(|j| j.node_id.to_string())
            .collect();
        assert_eq!(ids, ["1.2", "1.1"], "blocked node takes priority");
    }

    #[test]
    fn informational_challenge_does_not_outrank() {
        let state = Builder::new()
            .validated("1")
            .node("1.1")
            .node("1.2")
            .challenged("ch-1", "1.2", ChallengeTarget::Scope)
            .state();
        let board = find_jobs(&state, &policy());
        let ids: Vec<String> = board
            .prover_jobs
            .iter()
            .map(|j| j.node_id.to_string())
            .collect();
        assert_eq!(ids, ["1.1", "1.2"], "scope challenges are informational");
        assert_eq!(board.prover_jobs[1].blocking_challenges, 0);
        assert_eq!(board.prover_jobs[1].open_challenges, 1);
    }

    #[test]
    fn validated_unchallenged_nodes_become_audits() {
        let state = Builder::new().validated("1").node("1.1").validated("1.1").state();
        let board = find_jobs(&state, &policy());
        let audits: Vec<&VerifierJob> = board
            .verifier_jobs
            .iter()
            .filter(|j| j.action == VerifierAction::Audit)
            .collect();
        assert_eq!(audits.len(), 2);
    }

    #[test]
    fn audits_sort_after_reviews() {
        let state = Builder::new().validated("1").node("1.1").node("1.2").state();
        // 1 is validated (audit), 1.1/1.2 pending (review).
        let board = find_jobs(&state, &policy());
        let actions: Vec<VerifierAction> =
            board.verifier_jobs.iter().map(|j| j.action).collect();
        assert_eq!(
            actions,
            [
                VerifierAction::Review,
                VerifierAction::Review,
                VerifierAction::Audit
            ]
        );
    }

    #[test]
    fn identical_state_yields_identical_jobs() {
        let build = || {
            Builder::new()
                .validated("1")
                .node("1.1")
                .node("1.2")
                .challenged("ch-1", "1.1", ChallengeTarget::Gap)
                .state()
        };
        let a = find_jobs(&build(), &policy());
        let b = find_jobs(&build(), &policy());
        assert_eq!(a.prover_jobs, b.prover_jobs);
        assert_eq!(a.verifier_jobs, b.verifier_jobs);
    }
}
