//! The workbench: the service layer every front-end talks to.
//!
//! Each mutating operation runs one locked session: acquire the exclusive
//! directory lock, replay the ledger, check preconditions, append the
//! operation's events plus any derived `taint_recomputed` diffs in a single
//! batch, release. Read-only operations skip the lock; the ledger's
//! torn-tail tolerance makes them safe against a concurrent writer.

use crate::config::{self, WorkbenchConfig};
use crate::error::{InputError, Result, StructuralError, TransitionError};
use crate::event::{Event, EventPayload};
use crate::health::{self, HealthReport};
use crate::jobs::{self, JobBoard};
use crate::ledger::Ledger;
use crate::lock::WriteLock;
use crate::model::assumption::Assumption;
use crate::model::challenge::ChallengeTarget;
use crate::model::node::{EpistemicState, Inference, Node, NodeKind, TaintState, WorkflowState};
use crate::model::node_id::NodeId;
use crate::projection::{Lemma, State};
use crate::store::AssumptionStore;
use crate::taint::{self, TaintReport};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::info;

/// Hex digits of the hash used in generated challenge ids.
const CHALLENGE_ID_HEX: usize = 12;

/// Service handle for one proof workspace.
#[derive(Debug)]
pub struct Workbench {
    root: PathBuf,
    ledger: Ledger,
    store: AssumptionStore,
    config: WorkbenchConfig,
}

/// Receipt returned by [`Workbench::claim`].
#[derive(Debug, Clone)]
pub struct ClaimReceipt {
    pub node_ids: Vec<NodeId>,
    pub owner: String,
    pub expires_at: DateTime<Utc>,
}

impl Workbench {
    /// Open an existing workspace.
    ///
    /// # Errors
    ///
    /// `not_initialized` when no ledger exists at `root`; config errors
    /// when `config.toml` is present but malformed.
    pub fn open(root: &Path) -> Result<Self> {
        let ledger = Ledger::open(root);
        if !ledger.exists() {
            return Err(StructuralError::NotInitialized {
                path: root.to_path_buf(),
            }
            .into());
        }
        let config = config::load(root).map_err(|e| {
            crate::error::PersistenceError::Io {
                path: root.join(config::CONFIG_FILE),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            root: root.to_path_buf(),
            store: AssumptionStore::open(root),
            ledger,
            config,
        })
    }

    /// Initialize a fresh workspace: ledger, assumptions directory, and the
    /// `proof_initialized` event seeding root node `1`.
    ///
    /// # Errors
    ///
    /// `already_initialized` when a ledger exists; `empty_field` on blank
    /// conjecture or author.
    pub fn init(root: &Path, conjecture: &str, author: &str) -> Result<Self> {
        require_non_empty(conjecture, "conjecture")?;
        require_non_empty(author, "author")?;

        if Ledger::open(root).exists() {
            return Err(StructuralError::AlreadyInitialized {
                path: root.to_path_buf(),
            }
            .into());
        }

        let ledger = Ledger::create(root)?;
        let store = AssumptionStore::open(root);
        store.ensure()?;
        let config = config::load(root).unwrap_or_default();

        let workbench = Self {
            root: root.to_path_buf(),
            ledger,
            store,
            config,
        };
        let _session = workbench.write_lock()?;
        workbench.ledger.append(EventPayload::ProofInitialized {
            conjecture: conjecture.to_string(),
            author: author.to_string(),
            created_at: Utc::now(),
        })?;
        info!(root = %root.display(), "proof initialized");
        Ok(workbench)
    }

    /// The workspace root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The effective configuration.
    #[must_use]
    pub const fn config(&self) -> &WorkbenchConfig {
        &self.config
    }

    /// The assumption side-store.
    #[must_use]
    pub const fn assumptions(&self) -> &AssumptionStore {
        &self.store
    }

    /// Replay the ledger into a projection snapshot for read-only queries.
    ///
    /// # Errors
    ///
    /// Propagates ledger and integrity failures.
    pub fn load_state(&self) -> Result<State> {
        State::replay(&self.ledger)
    }

    // -- Claiming -----------------------------------------------------------

    /// Claim nodes for `owner` until `now + timeout_secs`.
    ///
    /// Re-claiming a node already held by the same owner extends the
    /// deadline. All-or-nothing: any invalid node fails the whole claim.
    ///
    /// # Errors
    ///
    /// `node_not_found`, `wrong_owner` when a node is held by someone else.
    pub fn claim(
        &self,
        node_ids: &[NodeId],
        owner: &str,
        timeout_secs: Option<u64>,
    ) -> Result<ClaimReceipt> {
        require_non_empty(owner, "owner")?;
        let timeout_secs = timeout_secs.unwrap_or(self.config.claims.default_timeout_secs);

        let _session = self.write_lock()?;
        let state = self.load_state()?;
        for node_id in node_ids {
            let node = require_node(&state, node_id)?;
            if let Some(holder) = &node.claimed_by {
                if holder != owner {
                    return Err(TransitionError::WrongOwner {
                        node_id: node_id.clone(),
                        actual: holder.clone(),
                        supplied: owner.to_string(),
                    }
                    .into());
                }
            }
        }

        let acquired_at = Utc::now();
        let expires_at =
            acquired_at + chrono::Duration::seconds(i64::try_from(timeout_secs).unwrap_or(i64::MAX));
        self.ledger.append(EventPayload::NodesClaimed {
            node_ids: node_ids.to_vec(),
            owner: owner.to_string(),
            timeout_secs,
            acquired_at,
        })?;
        Ok(ClaimReceipt {
            node_ids: node_ids.to_vec(),
            owner: owner.to_string(),
            expires_at,
        })
    }

    /// Release nodes held by `owner`. Releasing an already-available node is
    /// a no-op; releasing someone else's claim is an error.
    ///
    /// # Errors
    ///
    /// `node_not_found`, `wrong_owner`.
    pub fn release(&self, node_ids: &[NodeId], owner: &str) -> Result<Vec<NodeId>> {
        require_non_empty(owner, "owner")?;

        let _session = self.write_lock()?;
        let state = self.load_state()?;
        let mut released = Vec::new();
        for node_id in node_ids {
            let node = require_node(&state, node_id)?;
            match &node.claimed_by {
                Some(holder) if holder == owner => released.push(node_id.clone()),
                Some(holder) => {
                    return Err(TransitionError::WrongOwner {
                        node_id: node_id.clone(),
                        actual: holder.clone(),
                        supplied: owner.to_string(),
                    }
                    .into());
                }
                // Idempotent: already available.
                None => {}
            }
        }

        if !released.is_empty() {
            self.ledger.append(EventPayload::NodesReleased {
                node_ids: released.clone(),
            })?;
        }
        Ok(released)
    }

    /// Reap every claim whose deadline has passed as of `now`.
    ///
    /// # Errors
    ///
    /// Propagates ledger failures.
    pub fn reap_expired_locks(&self, now: DateTime<Utc>) -> Result<Vec<NodeId>> {
        let _session = self.write_lock()?;
        let state = self.load_state()?;

        let payloads: Vec<EventPayload> = state
            .claims()
            .filter(|claim| claim.is_expired(now))
            .map(|claim| EventPayload::LockReaped {
                node_id: claim.node_id.clone(),
                owner: claim.owner.clone(),
                expired_at: claim.expires_at,
            })
            .collect();

        let reaped: Vec<NodeId> = payloads
            .iter()
            .filter_map(|p| p.node_ids().into_iter().next())
            .collect();
        if !payloads.is_empty() {
            self.ledger.append_all(payloads)?;
            info!(count = reaped.len(), "expired locks reaped");
        }
        Ok(reaped)
    }

    // -- Tree growth --------------------------------------------------------

    /// Create a child under a claimed parent, at the smallest free index.
    ///
    /// # Errors
    ///
    /// `not_claimed`/`wrong_owner` unless `owner` holds the parent;
    /// `wrong_epistemic_state` unless the parent is pending,
    /// needs-refinement, or validated.
    pub fn refine(
        &self,
        parent: &NodeId,
        statement: &str,
        inference: Inference,
        owner: &str,
        kind: NodeKind,
    ) -> Result<NodeId> {
        require_non_empty(statement, "statement")?;
        require_non_empty(owner, "owner")?;

        let _session = self.write_lock()?;
        let state = self.load_state()?;
        let parent_node = require_node(&state, parent)?;
        require_owner(parent_node, owner)?;
        if !matches!(
            parent_node.epistemic,
            EpistemicState::Pending | EpistemicState::NeedsRefinement | EpistemicState::Validated
        ) {
            return Err(TransitionError::WrongEpistemicState {
                node_id: parent.clone(),
                found: parent_node.epistemic,
                required: "pending, needs_refinement, or validated",
            }
            .into());
        }

        let node_id = parent.child(state.next_child_index(parent));
        self.ledger.append(EventPayload::NodeCreated {
            node_id: node_id.clone(),
            kind,
            statement: statement.to_string(),
            inference,
            parent: parent.clone(),
        })?;
        Ok(node_id)
    }

    // -- Epistemic transitions ----------------------------------------------

    /// Validate a node. Refused while open *blocking* challenges exist.
    ///
    /// # Errors
    ///
    /// `wrong_epistemic_state`, `challenge_still_open`.
    pub fn accept(&self, node_id: &NodeId) -> Result<()> {
        let _session = self.write_lock()?;
        let state = self.load_state()?;
        let node = require_node(&state, node_id)?;
        require_transition(node, EpistemicState::Validated, "pending or needs_refinement")?;

        let blocking: Vec<String> = state
            .open_challenges_for(node_id)
            .into_iter()
            .filter(|ch| self.config.challenges.is_blocking(ch.target))
            .map(|ch| ch.id.clone())
            .collect();
        if !blocking.is_empty() {
            return Err(TransitionError::ChallengeStillOpen {
                node_id: node_id.clone(),
                challenge_ids: blocking,
            }
            .into());
        }

        self.commit_with_taint(
            state,
            vec![EventPayload::NodeValidated {
                node_id: node_id.clone(),
            }],
        )
    }

    /// Admit a node without verification, introducing taint.
    ///
    /// # Errors
    ///
    /// `wrong_epistemic_state` unless the node is pending.
    pub fn admit(&self, node_id: &NodeId) -> Result<()> {
        let _session = self.write_lock()?;
        let state = self.load_state()?;
        let node = require_node(&state, node_id)?;
        require_transition(node, EpistemicState::Admitted, "pending")?;
        self.commit_with_taint(
            state,
            vec![EventPayload::NodeAdmitted {
                node_id: node_id.clone(),
            }],
        )
    }

    /// Refute a node.
    ///
    /// # Errors
    ///
    /// `wrong_epistemic_state` unless the node is pending.
    pub fn refute(&self, node_id: &NodeId, reason: Option<String>) -> Result<()> {
        let _session = self.write_lock()?;
        let state = self.load_state()?;
        let node = require_node(&state, node_id)?;
        require_transition(node, EpistemicState::Refuted, "pending")?;
        self.commit_with_taint(
            state,
            vec![EventPayload::NodeRefuted {
                node_id: node_id.clone(),
                reason,
            }],
        )
    }

    /// Archive a settled node.
    ///
    /// # Errors
    ///
    /// `wrong_epistemic_state` unless the node is validated, admitted, or
    /// refuted.
    pub fn archive(&self, node_id: &NodeId) -> Result<()> {
        let _session = self.write_lock()?;
        let state = self.load_state()?;
        let node = require_node(&state, node_id)?;
        require_transition(node, EpistemicState::Archived, "validated, admitted, or refuted")?;
        self.commit_with_taint(
            state,
            vec![EventPayload::NodeArchived {
                node_id: node_id.clone(),
            }],
        )
    }

    /// Send a validated node back for refinement.
    ///
    /// # Errors
    ///
    /// `wrong_epistemic_state` unless the node is validated.
    pub fn request_refinement(&self, node_id: &NodeId, reason: &str, agent: &str) -> Result<()> {
        require_non_empty(reason, "reason")?;
        require_non_empty(agent, "agent")?;

        let _session = self.write_lock()?;
        let state = self.load_state()?;
        let node = require_node(&state, node_id)?;
        require_transition(node, EpistemicState::NeedsRefinement, "validated")?;
        self.commit_with_taint(
            state,
            vec![EventPayload::NodeRefinementRequested {
                node_id: node_id.clone(),
                reason: reason.to_string(),
                agent: agent.to_string(),
            }],
        )
    }

    // -- Challenges ---------------------------------------------------------

    /// Raise a challenge, optionally superseding an older open one.
    ///
    /// Returns the fresh challenge id.
    ///
    /// # Errors
    ///
    /// `wrong_epistemic_state` on archived nodes; `challenge_not_found` /
    /// `challenge_not_open` for a bad `supersedes` reference.
    pub fn challenge(
        &self,
        node_id: &NodeId,
        target: ChallengeTarget,
        reason: &str,
        raised_by: Option<String>,
        supersedes: Option<&str>,
    ) -> Result<String> {
        require_non_empty(reason, "reason")?;

        let _session = self.write_lock()?;
        let loaded = self.ledger.load()?;
        let state = State::replay_events(&loaded.events)?;
        let node = require_node(&state, node_id)?;
        if node.epistemic == EpistemicState::Archived {
            return Err(TransitionError::WrongEpistemicState {
                node_id: node_id.clone(),
                found: node.epistemic,
                required: "any non-archived state",
            }
            .into());
        }
        if let Some(old_id) = supersedes {
            let old = require_challenge(&state, old_id)?;
            if !old.status.is_open() {
                return Err(TransitionError::ChallengeNotOpen {
                    challenge_id: old_id.to_string(),
                    status: old.status,
                }
                .into());
            }
        }

        // Fresh id: hash the target coordinates with the next seq so that
        // re-raising an identical objection later still gets a new identity.
        let digest = blake3::hash(
            format!("{}|{node_id}|{target}|{reason}", loaded.record_count + 1).as_bytes(),
        );
        let challenge_id = format!("ch-{}", &digest.to_hex().as_str()[..CHALLENGE_ID_HEX]);

        let mut payloads = vec![EventPayload::ChallengeRaised {
            challenge_id: challenge_id.clone(),
            node_id: node_id.clone(),
            target,
            reason: reason.to_string(),
            raised_by,
        }];
        if let Some(old_id) = supersedes {
            payloads.push(EventPayload::ChallengeSuperseded {
                old_id: old_id.to_string(),
                new_id: challenge_id.clone(),
            });
        }
        self.ledger.append_all(payloads)?;
        Ok(challenge_id)
    }

    /// Resolve an open challenge.
    ///
    /// # Errors
    ///
    /// `challenge_not_found`, `challenge_not_open`.
    pub fn resolve_challenge(&self, challenge_id: &str, response: Option<String>) -> Result<()> {
        let _session = self.write_lock()?;
        let state = self.load_state()?;
        let challenge = require_challenge(&state, challenge_id)?;
        if !challenge.status.is_open() {
            return Err(TransitionError::ChallengeNotOpen {
                challenge_id: challenge_id.to_string(),
                status: challenge.status,
            }
            .into());
        }
        self.ledger.append(EventPayload::ChallengeResolved {
            challenge_id: challenge_id.to_string(),
            response,
        })?;
        Ok(())
    }

    /// Withdraw an open challenge.
    ///
    /// # Errors
    ///
    /// `challenge_not_found`, `challenge_not_open`.
    pub fn withdraw_challenge(&self, challenge_id: &str) -> Result<()> {
        let _session = self.write_lock()?;
        let state = self.load_state()?;
        let challenge = require_challenge(&state, challenge_id)?;
        if !challenge.status.is_open() {
            return Err(TransitionError::ChallengeNotOpen {
                challenge_id: challenge_id.to_string(),
                status: challenge.status,
            }
            .into());
        }
        self.ledger.append(EventPayload::ChallengeWithdrawn {
            challenge_id: challenge_id.to_string(),
        })?;
        Ok(())
    }

    // -- Assumptions and lemmas ---------------------------------------------

    /// Record a globally-scoped assumption. Re-adding the same statement is
    /// idempotent and returns the existing record.
    ///
    /// # Errors
    ///
    /// `empty_field` on a blank statement; persistence failures.
    pub fn add_assumption(
        &self,
        statement: &str,
        justification: Option<String>,
    ) -> Result<Assumption> {
        require_non_empty(statement, "statement")?;

        let _session = self.write_lock()?;
        let state = self.load_state()?;
        let id = Assumption::id_for(statement);
        if let Some(existing) = state.assumptions().find(|a| a.id == id) {
            return Ok(existing.clone());
        }

        let assumption = Assumption::new(statement.to_string(), justification, Utc::now());
        self.ledger.append(EventPayload::AssumptionAdded {
            assumption: assumption.clone(),
        })?;
        self.store.save(&assumption)?;
        Ok(assumption)
    }

    /// Extract a validated, clean node as a reusable lemma.
    ///
    /// # Errors
    ///
    /// `wrong_epistemic_state` unless the node is validated with clean
    /// taint (an admitted or tainted subtree is not reusable).
    pub fn extract_lemma(&self, node_id: &NodeId) -> Result<Lemma> {
        let _session = self.write_lock()?;
        let state = self.load_state()?;
        let node = require_node(&state, node_id)?;
        if node.epistemic != EpistemicState::Validated {
            return Err(TransitionError::WrongEpistemicState {
                node_id: node_id.clone(),
                found: node.epistemic,
                required: "validated",
            }
            .into());
        }
        let labels = taint::analyze(&state);
        if labels.get(node_id) != Some(&TaintState::Clean) {
            return Err(TransitionError::WrongEpistemicState {
                node_id: node_id.clone(),
                found: node.epistemic,
                required: "validated with clean taint",
            }
            .into());
        }

        let lemma = Lemma {
            node_id: node_id.clone(),
            statement: node.statement.clone(),
        };
        self.ledger.append(EventPayload::LemmaExtracted {
            node_id: lemma.node_id.clone(),
            statement: lemma.statement.clone(),
        })?;
        Ok(lemma)
    }

    // -- Derived computations -----------------------------------------------

    /// Recompute taint labels. In dry-run mode nothing is appended; in
    /// mutating mode one `taint_recomputed` event lands per changed node.
    ///
    /// # Errors
    ///
    /// Propagates ledger failures.
    pub fn recompute_taint(&self, dry_run: bool) -> Result<TaintReport> {
        if dry_run {
            let state = self.load_state()?;
            return Ok(taint::recompute(&state));
        }

        let _session = self.write_lock()?;
        let state = self.load_state()?;
        let report = taint::recompute(&state);
        if !report.diffs.is_empty() {
            let payloads: Vec<EventPayload> = report
                .diffs
                .iter()
                .map(|d| EventPayload::TaintRecomputed {
                    node_id: d.node_id.clone(),
                    new_taint: d.new,
                })
                .collect();
            self.ledger.append_all(payloads)?;
        }
        Ok(report)
    }

    /// Enumerate prover and verifier work items.
    ///
    /// # Errors
    ///
    /// Propagates ledger failures.
    pub fn find_jobs(&self) -> Result<JobBoard> {
        let state = self.load_state()?;
        Ok(jobs::find_jobs(&state, &self.config.challenges))
    }

    /// Diagnose proof health.
    ///
    /// # Errors
    ///
    /// Propagates ledger failures.
    pub fn health(&self) -> Result<HealthReport> {
        let state = self.load_state()?;
        Ok(health::diagnose(&state, &self.config.challenges))
    }

    /// Events affecting one node, in seq order.
    ///
    /// Challenge status events count as affecting the node their challenge
    /// was raised against.
    ///
    /// # Errors
    ///
    /// `node_not_found` for unknown ids.
    pub fn history(&self, node_id: &NodeId) -> Result<Vec<Event>> {
        let loaded = self.ledger.load()?;
        let state = State::replay_events(&loaded.events)?;
        require_node(&state, node_id)?;

        let events = loaded
            .events
            .into_iter()
            .filter(|event| {
                if event.payload.node_ids().contains(node_id) {
                    return true;
                }
                event.payload.challenge_ids().iter().any(|ch_id| {
                    state
                        .challenge(ch_id)
                        .is_some_and(|ch| &ch.node_id == node_id)
                })
            })
            .collect();
        Ok(events)
    }

    // -- Internals ----------------------------------------------------------

    fn write_lock(&self) -> Result<WriteLock> {
        Ok(WriteLock::acquire(&self.root, self.config.locking.timeout())?)
    }

    /// Append operation events followed by the taint diffs they induce, as
    /// one atomic batch.
    fn commit_with_taint(&self, mut state: State, payloads: Vec<EventPayload>) -> Result<()> {
        for payload in &payloads {
            state.apply(&Event {
                seq: 0,
                timestamp: Utc::now(),
                payload: payload.clone(),
            })?;
        }
        let report = taint::recompute(&state);

        let mut batch = payloads;
        batch.extend(report.diffs.into_iter().map(|d| EventPayload::TaintRecomputed {
            node_id: d.node_id,
            new_taint: d.new,
        }));
        self.ledger.append_all(batch)?;
        Ok(())
    }
}

fn require_non_empty(value: &str, field: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(InputError::EmptyField { field }.into());
    }
    Ok(())
}

fn require_node<'a>(state: &'a State, node_id: &NodeId) -> Result<&'a Node> {
    state.node(node_id).ok_or_else(|| {
        StructuralError::NodeNotFound {
            node_id: node_id.clone(),
        }
        .into()
    })
}

fn require_challenge<'a>(
    state: &'a State,
    challenge_id: &str,
) -> Result<&'a crate::model::challenge::Challenge> {
    state.challenge(challenge_id).ok_or_else(|| {
        StructuralError::ChallengeNotFound {
            challenge_id: challenge_id.to_string(),
        }
        .into()
    })
}

fn require_owner(node: &Node, owner: &str) -> Result<()> {
    match (&node.workflow, &node.claimed_by) {
        (WorkflowState::Claimed, Some(holder)) if holder == owner => Ok(()),
        (WorkflowState::Claimed, Some(holder)) => Err(TransitionError::WrongOwner {
            node_id: node.id.clone(),
            actual: holder.clone(),
            supplied: owner.to_string(),
        }
        .into()),
        _ => Err(TransitionError::NotClaimed {
            node_id: node.id.clone(),
        }
        .into()),
    }
}

fn require_transition(
    node: &Node,
    target: EpistemicState,
    required: &'static str,
) -> Result<()> {
    node.epistemic.can_transition_to(target).map_err(|_| {
        TransitionError::WrongEpistemicState {
            node_id: node.id.clone(),
            found: node.epistemic,
            required,
        }
        .into()
    })
}
