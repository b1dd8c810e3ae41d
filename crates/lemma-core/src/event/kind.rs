//! Event kind enum covering all 17 ledger event kinds.
//!
//! The string representation is the `type` discriminator persisted in every
//! ledger record.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The 17 event kinds in the lemma event catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Seed the proof with its conjecture and root node `1`.
    ProofInitialized,
    /// Create a new node under a claimed parent.
    NodeCreated,
    /// Claim one or more nodes for an agent, with a deadline.
    NodesClaimed,
    /// Release claimed nodes back to the pool.
    NodesReleased,
    /// Mark a node validated.
    NodeValidated,
    /// Accept a node without verification.
    NodeAdmitted,
    /// Refute a node.
    NodeRefuted,
    /// Archive a settled node.
    NodeArchived,
    /// Send a validated node back for refinement.
    NodeRefinementRequested,
    /// Raise a challenge against a node.
    ChallengeRaised,
    /// Resolve an open challenge.
    ChallengeResolved,
    /// Withdraw an open challenge.
    ChallengeWithdrawn,
    /// Mark an old challenge as subsumed by a newer one.
    ChallengeSuperseded,
    /// Record a globally-scoped assumption.
    AssumptionAdded,
    /// Persist a recomputed taint label for one node.
    TaintRecomputed,
    /// Extract a validated clean node as a reusable lemma.
    LemmaExtracted,
    /// Reap an expired claim.
    LockReaped,
}

/// Error returned when parsing an unknown event kind string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventKind {
    /// The unrecognised input string.
    pub raw: String,
}

impl fmt::Display for UnknownEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event kind '{}'", self.raw)
    }
}

impl std::error::Error for UnknownEventKind {}

impl EventKind {
    /// All known event kinds in catalog order.
    pub const ALL: [Self; 17] = [
        Self::ProofInitialized,
        Self::NodeCreated,
        Self::NodesClaimed,
        Self::NodesReleased,
        Self::NodeValidated,
        Self::NodeAdmitted,
        Self::NodeRefuted,
        Self::NodeArchived,
        Self::NodeRefinementRequested,
        Self::ChallengeRaised,
        Self::ChallengeResolved,
        Self::ChallengeWithdrawn,
        Self::ChallengeSuperseded,
        Self::AssumptionAdded,
        Self::TaintRecomputed,
        Self::LemmaExtracted,
        Self::LockReaped,
    ];

    /// Return the canonical discriminator string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProofInitialized => "proof_initialized",
            Self::NodeCreated => "node_created",
            Self::NodesClaimed => "nodes_claimed",
            Self::NodesReleased => "nodes_released",
            Self::NodeValidated => "node_validated",
            Self::NodeAdmitted => "node_admitted",
            Self::NodeRefuted => "node_refuted",
            Self::NodeArchived => "node_archived",
            Self::NodeRefinementRequested => "node_refinement_requested",
            Self::ChallengeRaised => "challenge_raised",
            Self::ChallengeResolved => "challenge_resolved",
            Self::ChallengeWithdrawn => "challenge_withdrawn",
            Self::ChallengeSuperseded => "challenge_superseded",
            Self::AssumptionAdded => "assumption_added",
            Self::TaintRecomputed => "taint_recomputed",
            Self::LemmaExtracted => "lemma_extracted",
            Self::LockReaped => "lock_reaped",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proof_initialized" => Ok(Self::ProofInitialized),
            "node_created" => Ok(Self::NodeCreated),
            "nodes_claimed" => Ok(Self::NodesClaimed),
            "nodes_released" => Ok(Self::NodesReleased),
            "node_validated" => Ok(Self::NodeValidated),
            "node_admitted" => Ok(Self::NodeAdmitted),
            "node_refuted" => Ok(Self::NodeRefuted),
            "node_archived" => Ok(Self::NodeArchived),
            "node_refinement_requested" => Ok(Self::NodeRefinementRequested),
            "challenge_raised" => Ok(Self::ChallengeRaised),
            "challenge_resolved" => Ok(Self::ChallengeResolved),
            "challenge_withdrawn" => Ok(Self::ChallengeWithdrawn),
            "challenge_superseded" => Ok(Self::ChallengeSuperseded),
            "assumption_added" => Ok(Self::AssumptionAdded),
            "taint_recomputed" => Ok(Self::TaintRecomputed),
            "lemma_extracted" => Ok(Self::LemmaExtracted),
            "lock_reaped" => Ok(Self::LockReaped),
            _ => Err(UnknownEventKind { raw: s.to_string() }),
        }
    }
}

// Custom serde: serialize as the discriminator string.
impl Serialize for EventKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}
