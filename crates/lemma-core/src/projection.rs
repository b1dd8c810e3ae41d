//! Projection: the current proof-tree state as a fold of the ledger.
//!
//! `State` is a cache — the ledger is authoritative. Replay applies events
//! strictly in `seq` order and does not re-validate the preconditions that
//! held when each event was appended (historic ledgers must replay even if
//! validation logic evolves), but it does detect *structural* corruption:
//! a created node whose parent never existed, a duplicate node id, or a
//! challenge status event for a challenge that was never raised.

use crate::error::{PersistenceError, Result};
use crate::event::{Event, EventPayload};
use crate::ledger::Ledger;
use crate::model::assumption::Assumption;
use crate::model::challenge::Challenge;
use crate::model::claim::Claim;
use crate::model::node::{EpistemicState, Inference, Node, NodeKind, WorkflowState};
use crate::model::node_id::NodeId;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Proof-level metadata from the `proof_initialized` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofMeta {
    pub conjecture: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

/// An extracted lemma, available for reuse as a `lemma_ref` node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lemma {
    pub node_id: NodeId,
    pub statement: String,
}

/// The current proof-tree state derived by replaying the ledger.
#[derive(Debug, Default)]
pub struct State {
    meta: Option<ProofMeta>,
    nodes: BTreeMap<NodeId, Node>,
    children: HashMap<NodeId, Vec<NodeId>>,
    challenges: BTreeMap<String, Challenge>,
    challenges_by_node: HashMap<NodeId, Vec<String>>,
    assumptions: BTreeMap<String, Assumption>,
    claims: BTreeMap<NodeId, Claim>,
    lemmas: Vec<Lemma>,
}

impl State {
    /// Replay the whole ledger into a fresh projection.
    ///
    /// # Errors
    ///
    /// Propagates ledger load failures and raises `ledger_integrity` on
    /// structural corruption.
    pub fn replay(ledger: &Ledger) -> Result<Self> {
        let loaded = ledger.load()?;
        let state = Self::replay_events(&loaded.events)?;
        debug!(
            events = loaded.events.len(),
            nodes = state.nodes.len(),
            "projection replayed"
        );
        Ok(state)
    }

    /// Fold a slice of events into a projection. Pure and deterministic.
    ///
    /// # Errors
    ///
    /// Raises `ledger_integrity` on structural corruption.
    pub fn replay_events(events: &[Event]) -> Result<Self> {
        let mut state = Self::default();
        for event in events {
            state.apply(event)?;
        }
        Ok(state)
    }

    /// Apply one event to the projection.
    ///
    /// # Errors
    ///
    /// Raises `ledger_integrity` on structural corruption.
    pub fn apply(&mut self, event: &Event) -> Result<()> {
        match &event.payload {
            EventPayload::ProofInitialized {
                conjecture,
                author,
                created_at,
            } => {
                if self.meta.is_some() {
                    return Err(integrity(event.seq, "duplicate proof_initialized"));
                }
                self.meta = Some(ProofMeta {
                    conjecture: conjecture.clone(),
                    author: author.clone(),
                    created_at: *created_at,
                });
                let root = Node::new(
                    NodeId::root(),
                    NodeKind::Claim,
                    conjecture.clone(),
                    Inference::Conjecture,
                    *created_at,
                );
                self.insert_node(root, event.seq)?;
            }
            EventPayload::NodeCreated {
                node_id,
                kind,
                statement,
                inference,
                parent,
            } => {
                if !self.nodes.contains_key(parent) {
                    return Err(integrity(
                        event.seq,
                        &format!("node_created '{node_id}' references missing parent '{parent}'"),
                    ));
                }
                let node = Node::new(
                    node_id.clone(),
                    *kind,
                    statement.clone(),
                    inference.clone(),
                    event.timestamp,
                );
                self.insert_node(node, event.seq)?;
            }
            EventPayload::NodesClaimed {
                node_ids,
                owner,
                timeout_secs,
                acquired_at,
            } => {
                let timeout = i64::try_from(*timeout_secs).unwrap_or(i64::MAX);
                let expires_at = *acquired_at + Duration::seconds(timeout);
                for node_id in node_ids {
                    let node = self.node_mut(node_id, event.seq)?;
                    node.workflow = WorkflowState::Claimed;
                    node.claimed_by = Some(owner.clone());
                    node.claim_deadline = Some(expires_at);
                    self.claims.insert(
                        node_id.clone(),
                        Claim {
                            node_id: node_id.clone(),
                            owner: owner.clone(),
                            acquired_at: *acquired_at,
                            expires_at,
                        },
                    );
                }
            }
            EventPayload::NodesReleased { node_ids } => {
                for node_id in node_ids {
                    let node = self.node_mut(node_id, event.seq)?;
                    if node.workflow == WorkflowState::Available {
                        // Idempotent release: tolerated but noted.
                        warn!(seq = event.seq, %node_id, "release of unclaimed node");
                    }
                    node.workflow = WorkflowState::Available;
                    node.claimed_by = None;
                    node.claim_deadline = None;
                    self.claims.remove(node_id);
                }
            }
            EventPayload::NodeValidated { node_id } => {
                self.node_mut(node_id, event.seq)?.epistemic = EpistemicState::Validated;
            }
            EventPayload::NodeAdmitted { node_id } => {
                self.node_mut(node_id, event.seq)?.epistemic = EpistemicState::Admitted;
            }
            EventPayload::NodeRefuted { node_id, .. } => {
                self.node_mut(node_id, event.seq)?.epistemic = EpistemicState::Refuted;
            }
            EventPayload::NodeArchived { node_id } => {
                self.node_mut(node_id, event.seq)?.epistemic = EpistemicState::Archived;
            }
            EventPayload::NodeRefinementRequested { node_id, .. } => {
                self.node_mut(node_id, event.seq)?.epistemic = EpistemicState::NeedsRefinement;
            }
            EventPayload::ChallengeRaised {
                challenge_id,
                node_id,
                target,
                reason,
                raised_by,
            } => {
                if !self.nodes.contains_key(node_id) {
                    return Err(integrity(
                        event.seq,
                        &format!("challenge_raised on missing node '{node_id}'"),
                    ));
                }
                if self.challenges.contains_key(challenge_id) {
                    return Err(integrity(
                        event.seq,
                        &format!("duplicate challenge id '{challenge_id}'"),
                    ));
                }
                self.challenges.insert(
                    challenge_id.clone(),
                    Challenge::new(
                        challenge_id.clone(),
                        node_id.clone(),
                        *target,
                        reason.clone(),
                        raised_by.clone(),
                        event.timestamp,
                    ),
                );
                self.challenges_by_node
                    .entry(node_id.clone())
                    .or_default()
                    .push(challenge_id.clone());
            }
            EventPayload::ChallengeResolved { challenge_id, .. } => {
                self.challenge_mut(challenge_id, event.seq)?.status =
                    crate::model::challenge::ChallengeStatus::Resolved;
            }
            EventPayload::ChallengeWithdrawn { challenge_id } => {
                self.challenge_mut(challenge_id, event.seq)?.status =
                    crate::model::challenge::ChallengeStatus::Withdrawn;
            }
            EventPayload::ChallengeSuperseded { old_id, .. } => {
                self.challenge_mut(old_id, event.seq)?.status =
                    crate::model::challenge::ChallengeStatus::Superseded;
            }
            EventPayload::AssumptionAdded { assumption } => {
                // Content-addressed: re-insertion of the same id is a no-op.
                self.assumptions
                    .entry(assumption.id.clone())
                    .or_insert_with(|| assumption.clone());
            }
            EventPayload::TaintRecomputed { node_id, new_taint } => {
                self.node_mut(node_id, event.seq)?.taint = *new_taint;
            }
            EventPayload::LemmaExtracted { node_id, statement } => {
                if !self.nodes.contains_key(node_id) {
                    return Err(integrity(
                        event.seq,
                        &format!("lemma_extracted from missing node '{node_id}'"),
                    ));
                }
                self.lemmas.push(Lemma {
                    node_id: node_id.clone(),
                    statement: statement.clone(),
                });
            }
            EventPayload::LockReaped { node_id, .. } => {
                let node = self.node_mut(node_id, event.seq)?;
                if node.workflow == WorkflowState::Available {
                    warn!(seq = event.seq, %node_id, "lock_reaped on unclaimed node");
                }
                node.workflow = WorkflowState::Available;
                node.claimed_by = None;
                node.claim_deadline = None;
                self.claims.remove(node_id);
            }
        }
        Ok(())
    }

    fn insert_node(&mut self, node: Node, seq: u64) -> Result<()> {
        let id = node.id.clone();
        if self.nodes.contains_key(&id) {
            return Err(integrity(seq, &format!("duplicate node id '{id}'")));
        }
        if let Some(parent) = id.parent() {
            self.children.entry(parent).or_default().push(id.clone());
        }
        self.nodes.insert(id, node);
        Ok(())
    }

    fn node_mut(&mut self, node_id: &NodeId, seq: u64) -> Result<&mut Node> {
        self.nodes
            .get_mut(node_id)
            .ok_or_else(|| integrity(seq, &format!("event references missing node '{node_id}'")))
    }

    fn challenge_mut(&mut self, challenge_id: &str, seq: u64) -> Result<&mut Challenge> {
        self.challenges.get_mut(challenge_id).ok_or_else(|| {
            integrity(
                seq,
                &format!("event references missing challenge '{challenge_id}'"),
            )
        })
    }

    // -- Query surface ------------------------------------------------------

    /// Whether a `proof_initialized` event has been applied.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.meta.is_some()
    }

    /// Proof metadata, when initialized.
    #[must_use]
    pub const fn meta(&self) -> Option<&ProofMeta> {
        self.meta.as_ref()
    }

    /// Look up one node.
    #[must_use]
    pub fn node(&self, node_id: &NodeId) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    /// All nodes in id (pre-)order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Direct children of a node, in id order.
    #[must_use]
    pub fn children_of(&self, node_id: &NodeId) -> Vec<&Node> {
        let Some(ids) = self.children.get(node_id) else {
            return Vec::new();
        };
        let mut sorted: Vec<&NodeId> = ids.iter().collect();
        sorted.sort();
        sorted
            .into_iter()
            .filter_map(|id| self.nodes.get(id))
            .collect()
    }

    /// Whether the node has no children.
    #[must_use]
    pub fn is_leaf(&self, node_id: &NodeId) -> bool {
        self.children.get(node_id).is_none_or(Vec::is_empty)
    }

    /// All leaf nodes in id order.
    #[must_use]
    pub fn leaves(&self) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|node| self.is_leaf(&node.id))
            .collect()
    }

    /// The smallest unused child index under `parent` (1-based).
    #[must_use]
    pub fn next_child_index(&self, parent: &NodeId) -> u32 {
        let used: Vec<u32> = self
            .children
            .get(parent)
            .map(|ids| ids.iter().map(NodeId::last_index).collect())
            .unwrap_or_default();
        let mut index = 1;
        while used.contains(&index) {
            index += 1;
        }
        index
    }

    /// Look up one challenge.
    #[must_use]
    pub fn challenge(&self, challenge_id: &str) -> Option<&Challenge> {
        self.challenges.get(challenge_id)
    }

    /// All challenges in id order.
    pub fn challenges(&self) -> impl Iterator<Item = &Challenge> {
        self.challenges.values()
    }

    /// All open challenges in id order.
    #[must_use]
    pub fn open_challenges(&self) -> Vec<&Challenge> {
        self.challenges
            .values()
            .filter(|ch| ch.status.is_open())
            .collect()
    }

    /// Challenges raised against one node, in raise order.
    #[must_use]
    pub fn challenges_for(&self, node_id: &NodeId) -> Vec<&Challenge> {
        let Some(ids) = self.challenges_by_node.get(node_id) else {
            return Vec::new();
        };
        ids.iter().filter_map(|id| self.challenges.get(id)).collect()
    }

    /// Open challenges against one node.
    #[must_use]
    pub fn open_challenges_for(&self, node_id: &NodeId) -> Vec<&Challenge> {
        self.challenges_for(node_id)
            .into_iter()
            .filter(|ch| ch.status.is_open())
            .collect()
    }

    /// The active claim on one node, if any.
    #[must_use]
    pub fn claim(&self, node_id: &NodeId) -> Option<&Claim> {
        self.claims.get(node_id)
    }

    /// All active claims in node-id order.
    pub fn claims(&self) -> impl Iterator<Item = &Claim> {
        self.claims.values()
    }

    /// All stored assumptions in id order.
    pub fn assumptions(&self) -> impl Iterator<Item = &Assumption> {
        self.assumptions.values()
    }

    /// Extracted lemmas in extraction order.
    #[must_use]
    pub fn lemmas(&self) -> &[Lemma] {
        &self.lemmas
    }
}

fn integrity(seq: u64, reason: &str) -> crate::error::LemmaError {
    PersistenceError::LedgerIntegrity {
        reason: format!("at seq {seq}: {reason}"),
    }
    .into()
}
