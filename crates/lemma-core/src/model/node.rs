//! Proof-tree nodes and their state machines.
//!
//! A node is one claim in the tree. Two orthogonal state machines govern it:
//! the *epistemic* state (what we know about the claim) and the *workflow*
//! state (whether an agent currently holds it). The *taint* label is derived
//! by the analyzer and persisted on the node for query speed only.

use crate::model::node_id::NodeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The two kinds of node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// An ordinary claim to be proven in place.
    Claim,
    /// A reference to an extracted lemma proven elsewhere.
    LemmaRef,
}

impl NodeKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Claim => "claim",
            Self::LemmaRef => "lemma_ref",
        }
    }
}

/// The knowledge status of a claim.
///
/// `Archived` is terminal. `Refuted` is logically terminal for the claim but
/// still admits archival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpistemicState {
    Pending,
    Validated,
    Admitted,
    Refuted,
    Archived,
    NeedsRefinement,
}

impl EpistemicState {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Validated => "validated",
            Self::Admitted => "admitted",
            Self::Refuted => "refuted",
            Self::Archived => "archived",
            Self::NeedsRefinement => "needs_refinement",
        }
    }

    /// Validate whether a transition from `self` to `target` is allowed.
    ///
    /// Valid transitions:
    /// - `pending -> validated` (accept)
    /// - `pending -> admitted` (admit)
    /// - `pending -> refuted` (refute)
    /// - `validated -> needs_refinement` (request refinement)
    /// - `needs_refinement -> validated` (re-accept after refining)
    /// - `validated | admitted | refuted -> archived`
    pub fn can_transition_to(self, target: Self) -> Result<(), InvalidTransition> {
        let allowed = matches!(
            (self, target),
            (Self::Pending, Self::Validated)
                | (Self::Pending, Self::Admitted)
                | (Self::Pending, Self::Refuted)
                | (Self::Validated, Self::NeedsRefinement)
                | (Self::NeedsRefinement, Self::Validated)
                | (Self::Validated, Self::Archived)
                | (Self::Admitted, Self::Archived)
                | (Self::Refuted, Self::Archived)
        );

        if allowed {
            Ok(())
        } else {
            Err(InvalidTransition {
                from: self,
                to: target,
            })
        }
    }

    /// Whether no further epistemic transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Archived)
    }
}

/// Error returned when an epistemic transition is not allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: EpistemicState,
    pub to: EpistemicState,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot transition from '{}' to '{}'",
            self.from, self.to
        )
    }
}

impl std::error::Error for InvalidTransition {}

/// Whether a node is free for claiming or held by an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Available,
    Claimed,
}

impl WorkflowState {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Claimed => "claimed",
        }
    }
}

/// Derived epistemic-uncertainty label.
///
/// Persisted on the node for query speed; the analyzer recomputes it from
/// epistemic states and tree shape alone, so the stored value is advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaintState {
    /// Validated with no admitted ancestor, or terminally settled.
    Clean,
    /// The node itself was admitted without verification.
    SelfAdmitted,
    /// Validated, but some ancestor was admitted.
    Tainted,
    /// Still pending or awaiting refinement.
    Unresolved,
}

impl TaintState {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::SelfAdmitted => "self_admitted",
            Self::Tainted => "tainted",
            Self::Unresolved => "unresolved",
        }
    }
}

/// The declared reasoning rule used to derive a node from its siblings and
/// ancestors.
///
/// The catalog is open: unknown rules parse as [`Inference::Other`] so that
/// domain-specific rule names survive a round-trip through the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inference {
    /// The root node only: the conjecture is not derived from anything.
    Conjecture,
    Assumption,
    ModusPonens,
    Induction,
    CaseSplit,
    Rewrite,
    Other(String),
}

impl Inference {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Conjecture => "conjecture",
            Self::Assumption => "assumption",
            Self::ModusPonens => "modus_ponens",
            Self::Induction => "induction",
            Self::CaseSplit => "case_split",
            Self::Rewrite => "rewrite",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for Inference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Inference {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "conjecture" => Self::Conjecture,
            "assumption" => Self::Assumption,
            "modus_ponens" => Self::ModusPonens,
            "induction" => Self::Induction,
            "case_split" => Self::CaseSplit,
            "rewrite" => Self::Rewrite,
            other => Self::Other(other.to_string()),
        })
    }
}

impl Serialize for Inference {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Inference {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse().unwrap_or(Self::Other(s)))
    }
}

/// One claim in the proof tree (the projection-level aggregate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub statement: String,
    pub inference: Inference,
    pub epistemic: EpistemicState,
    pub workflow: WorkflowState,
    /// Agent identifier, present iff `workflow == Claimed`.
    pub claimed_by: Option<String>,
    /// Wall-clock deadline for the current claim, present iff claimed.
    pub claim_deadline: Option<DateTime<Utc>>,
    pub taint: TaintState,
    pub created_at: DateTime<Utc>,
}

impl Node {
    /// Build a fresh node in `pending`/`available` state.
    #[must_use]
    pub fn new(
        id: NodeId,
        kind: NodeKind,
        statement: String,
        inference: Inference,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind,
            statement,
            inference,
            epistemic: EpistemicState::Pending,
            workflow: WorkflowState::Available,
            claimed_by: None,
            claim_deadline: None,
            taint: TaintState::Unresolved,
            created_at,
        }
    }

    /// Whether the workflow/claimant invariant holds.
    #[must_use]
    pub fn claim_consistent(&self) -> bool {
        match self.workflow {
            WorkflowState::Claimed => self.claimed_by.is_some() && self.claim_deadline.is_some(),
            WorkflowState::Available => self.claimed_by.is_none() && self.claim_deadline.is_none(),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for EpistemicState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TaintState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_EPISTEMIC: [EpistemicState; 6] = [
        EpistemicState::Pending,
        EpistemicState::Validated,
        EpistemicState::Admitted,
        EpistemicState::Refuted,
        EpistemicState::Archived,
        EpistemicState::NeedsRefinement,
    ];

    #[test]
    fn pending_fans_out() {
        for target in [
            EpistemicState::Validated,
            EpistemicState::Admitted,
            EpistemicState::Refuted,
        ] {
            assert!(EpistemicState::Pending.can_transition_to(target).is_ok());
        }
        assert!(
            EpistemicState::Pending
                .can_transition_to(EpistemicState::Archived)
                .is_err(),
            "pending nodes cannot be archived directly"
        );
    }

    #[test]
    fn needs_refinement_only_from_validated() {
        assert!(
            EpistemicState::Validated
                .can_transition_to(EpistemicState::NeedsRefinement)
                .is_ok()
        );
        for from in [
            EpistemicState::Pending,
            EpistemicState::Admitted,
            EpistemicState::Refuted,
            EpistemicState::Archived,
        ] {
            assert!(
                from.can_transition_to(EpistemicState::NeedsRefinement).is_err(),
                "{from} should not reach needs_refinement"
            );
        }
    }

    #[test]
    fn needs_refinement_returns_to_validated() {
        assert!(
            EpistemicState::NeedsRefinement
                .can_transition_to(EpistemicState::Validated)
                .is_ok()
        );
    }

    #[test]
    fn archived_is_terminal() {
        assert!(EpistemicState::Archived.is_terminal());
        for target in ALL_EPISTEMIC {
            assert!(
                EpistemicState::Archived.can_transition_to(target).is_err(),
                "archived must not transition to {target}"
            );
        }
    }

    #[test]
    fn refuted_transitions_only_to_archived() {
        for target in ALL_EPISTEMIC {
            let result = EpistemicState::Refuted.can_transition_to(target);
            if target == EpistemicState::Archived {
                assert!(result.is_ok());
            } else {
                assert!(result.is_err(), "refuted must not transition to {target}");
            }
        }
    }

    #[test]
    fn no_op_transitions_rejected() {
        for state in ALL_EPISTEMIC {
            assert!(state.can_transition_to(state).is_err());
        }
    }

    #[test]
    fn invalid_transition_display_names_both_states() {
        let err = EpistemicState::Archived
            .can_transition_to(EpistemicState::Pending)
            .expect_err("archived is terminal");
        let msg = err.to_string();
        assert!(msg.contains("archived"));
        assert!(msg.contains("pending"));
    }

    #[test]
    fn new_node_defaults() {
        let node = Node::new(
            NodeId::root(),
            NodeKind::Claim,
            "C".into(),
            Inference::Assumption,
            Utc::now(),
        );
        assert_eq!(node.epistemic, EpistemicState::Pending);
        assert_eq!(node.workflow, WorkflowState::Available);
        assert_eq!(node.taint, TaintState::Unresolved);
        assert!(node.claim_consistent());
    }

    #[test]
    fn claim_consistency_detects_drift() {
        let mut node = Node::new(
            NodeId::root(),
            NodeKind::Claim,
            "C".into(),
            Inference::Assumption,
            Utc::now(),
        );
        node.workflow = WorkflowState::Claimed;
        assert!(!node.claim_consistent());
        node.claimed_by = Some("prover-a".into());
        node.claim_deadline = Some(Utc::now());
        assert!(node.claim_consistent());
    }

    #[test]
    fn inference_roundtrip_known_and_unknown() {
        for raw in ["assumption", "modus_ponens", "induction", "case_split", "rewrite"] {
            let parsed: Inference = raw.parse().expect("infallible");
            assert_eq!(parsed.as_str(), raw);
            assert!(!matches!(parsed, Inference::Other(_)));
        }
        let custom: Inference = "pigeonhole".parse().expect("infallible");
        assert_eq!(custom, Inference::Other("pigeonhole".into()));
        assert_eq!(custom.as_str(), "pigeonhole");
    }

    #[test]
    fn inference_serde_as_string() {
        let json = serde_json::to_string(&Inference::ModusPonens).expect("serialize");
        assert_eq!(json, "\"modus_ponens\"");
        let back: Inference = serde_json::from_str("\"pigeonhole\"").expect("deserialize");
        assert_eq!(back, Inference::Other("pigeonhole".into()));
    }

    #[test]
    fn state_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&EpistemicState::NeedsRefinement).expect("serialize"),
            "\"needs_refinement\""
        );
        assert_eq!(
            serde_json::to_string(&TaintState::SelfAdmitted).expect("serialize"),
            "\"self_admitted\""
        );
    }
}
