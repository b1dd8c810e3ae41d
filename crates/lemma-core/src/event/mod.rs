//! Event data model for the lemma ledger.
//!
//! Every record in the ledger is an [`Event`]: a dense sequence number, a
//! timestamp, and a typed payload. The wire form is one JSON object per
//! line, internally tagged by the `type` discriminator:
//!
//! ```text
//! {"seq":3,"timestamp":"2026-07-30T12:00:00.000000001Z","type":"node_validated","node_id":"1"}
//! ```
//!
//! Ordering authority is `seq`; timestamps are informational and may regress
//! across writers.

pub mod kind;

pub use kind::{EventKind, UnknownEventKind};

use crate::model::assumption::Assumption;
use crate::model::challenge::ChallengeTarget;
use crate::model::node::{Inference, NodeKind, TaintState};
use crate::model::node_id::NodeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single committed record in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Dense 1-based sequence number assigned at append.
    pub seq: u64,
    /// Wall-clock timestamp at append, RFC-3339 with nanoseconds.
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: EventPayload,
}

/// The typed payload of an event, tagged by the `type` field on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// Seeds root node `1` with the conjecture as its statement.
    ProofInitialized {
        conjecture: String,
        author: String,
        created_at: DateTime<Utc>,
    },
    NodeCreated {
        node_id: NodeId,
        kind: NodeKind,
        statement: String,
        inference: Inference,
        parent: NodeId,
    },
    NodesClaimed {
        node_ids: Vec<NodeId>,
        owner: String,
        timeout_secs: u64,
        acquired_at: DateTime<Utc>,
    },
    NodesReleased {
        node_ids: Vec<NodeId>,
    },
    NodeValidated {
        node_id: NodeId,
    },
    NodeAdmitted {
        node_id: NodeId,
    },
    NodeRefuted {
        node_id: NodeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    NodeArchived {
        node_id: NodeId,
    },
    NodeRefinementRequested {
        node_id: NodeId,
        reason: String,
        agent: String,
    },
    ChallengeRaised {
        challenge_id: String,
        node_id: NodeId,
        target: ChallengeTarget,
        reason: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        raised_by: Option<String>,
    },
    ChallengeResolved {
        challenge_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        response: Option<String>,
    },
    ChallengeWithdrawn {
        challenge_id: String,
    },
    ChallengeSuperseded {
        old_id: String,
        new_id: String,
    },
    AssumptionAdded {
        assumption: Assumption,
    },
    TaintRecomputed {
        node_id: NodeId,
        new_taint: TaintState,
    },
    LemmaExtracted {
        node_id: NodeId,
        statement: String,
    },
    LockReaped {
        node_id: NodeId,
        owner: String,
        expired_at: DateTime<Utc>,
    },
}

impl EventPayload {
    /// The kind discriminator of this payload.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::ProofInitialized { .. } => EventKind::ProofInitialized,
            Self::NodeCreated { .. } => EventKind::NodeCreated,
            Self::NodesClaimed { .. } => EventKind::NodesClaimed,
            Self::NodesReleased { .. } => EventKind::NodesReleased,
            Self::NodeValidated { .. } => EventKind::NodeValidated,
            Self::NodeAdmitted { .. } => EventKind::NodeAdmitted,
            Self::NodeRefuted { .. } => EventKind::NodeRefuted,
            Self::NodeArchived { .. } => EventKind::NodeArchived,
            Self::NodeRefinementRequested { .. } => EventKind::NodeRefinementRequested,
            Self::ChallengeRaised { .. } => EventKind::ChallengeRaised,
            Self::ChallengeResolved { .. } => EventKind::ChallengeResolved,
            Self::ChallengeWithdrawn { .. } => EventKind::ChallengeWithdrawn,
            Self::ChallengeSuperseded { .. } => EventKind::ChallengeSuperseded,
            Self::AssumptionAdded { .. } => EventKind::AssumptionAdded,
            Self::TaintRecomputed { .. } => EventKind::TaintRecomputed,
            Self::LemmaExtracted { .. } => EventKind::LemmaExtracted,
            Self::LockReaped { .. } => EventKind::LockReaped,
        }
    }

    /// Node ids the payload names directly.
    ///
    /// `proof_initialized` names the root. Challenge status events name no
    /// node; resolving them to a node requires the projection's
    /// challenge index.
    #[must_use]
    pub fn node_ids(&self) -> Vec<NodeId> {
        match self {
            Self::ProofInitialized { .. } => vec![NodeId::root()],
            Self::NodeCreated { node_id, .. }
            | Self::NodeValidated { node_id }
            | Self::NodeAdmitted { node_id }
            | Self::NodeRefuted { node_id, .. }
            | Self::NodeArchived { node_id }
            | Self::NodeRefinementRequested { node_id, .. }
            | Self::ChallengeRaised { node_id, .. }
            | Self::TaintRecomputed { node_id, .. }
            | Self::LemmaExtracted { node_id, .. }
            | Self::LockReaped { node_id, .. } => vec![node_id.clone()],
            Self::NodesClaimed { node_ids, .. } | Self::NodesReleased { node_ids } => {
                node_ids.clone()
            }
            Self::ChallengeResolved { .. }
            | Self::ChallengeWithdrawn { .. }
            | Self::AssumptionAdded { .. } => Vec::new(),
            Self::ChallengeSuperseded { .. } => Vec::new(),
        }
    }

    /// The challenge id a status event refers to, if any.
    #[must_use]
    pub fn challenge_ids(&self) -> Vec<&str> {
        match self {
            Self::ChallengeRaised { challenge_id, .. }
            | Self::ChallengeResolved { challenge_id, .. }
            | Self::ChallengeWithdrawn { challenge_id } => vec![challenge_id],
            Self::ChallengeSuperseded { old_id, new_id } => vec![old_id, new_id],
            _ => Vec::new(),
        }
    }
}

impl Event {
    /// The kind discriminator of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {} {}", self.seq, self.timestamp.to_rfc3339(), self.kind())?;
        match &self.payload {
            EventPayload::ProofInitialized { conjecture, author, .. } => {
                write!(f, " '{conjecture}' by {author}")
            }
            EventPayload::NodeCreated { node_id, statement, .. } => {
                write!(f, " {node_id}: {statement}")
            }
            EventPayload::NodesClaimed { node_ids, owner, .. } => {
                write!(f, " [{}] by {owner}", join_ids(node_ids))
            }
            EventPayload::NodesReleased { node_ids } => {
                write!(f, " [{}]", join_ids(node_ids))
            }
            EventPayload::NodeValidated { node_id }
            | EventPayload::NodeAdmitted { node_id }
            | EventPayload::NodeArchived { node_id } => write!(f, " {node_id}"),
            EventPayload::NodeRefuted { node_id, reason } => match reason {
                Some(reason) => write!(f, " {node_id}: {reason}"),
                None => write!(f, " {node_id}"),
            },
            EventPayload::NodeRefinementRequested { node_id, agent, .. } => {
                write!(f, " {node_id} by {agent}")
            }
            EventPayload::ChallengeRaised { challenge_id, node_id, target, .. } => {
                write!(f, " {challenge_id} on {node_id} ({target})")
            }
            EventPayload::ChallengeResolved { challenge_id, .. }
            | EventPayload::ChallengeWithdrawn { challenge_id } => write!(f, " {challenge_id}"),
            EventPayload::ChallengeSuperseded { old_id, new_id } => {
                write!(f, " {old_id} -> {new_id}")
            }
            EventPayload::AssumptionAdded { assumption } => write!(f, " {}", assumption.id),
            EventPayload::TaintRecomputed { node_id, new_taint } => {
                write!(f, " {node_id} -> {new_taint}")
            }
            EventPayload::LemmaExtracted { node_id, .. } => write!(f, " from {node_id}"),
            EventPayload::LockReaped { node_id, owner, .. } => {
                write!(f, " {node_id} from {owner}")
            }
        }
    }
}

fn join_ids(ids: &[NodeId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn ts() -> DateTime<Utc> {
        DateTime::from_str("2026-07-30T12:00:00.000000001Z").expect("valid timestamp")
    }

    fn nid(s: &str) -> NodeId {
        s.parse().expect("valid id")
    }

    fn all_payloads() -> Vec<EventPayload> {
        vec![
            EventPayload::ProofInitialized {
                conjecture: "C".into(),
                author: "alice".into(),
                created_at: ts(),
            },
            EventPayload::NodeCreated {
                node_id: nid("1.1"),
                kind: NodeKind::Claim,
                statement: "S".into(),
                inference: Inference::Assumption,
                parent: NodeId::root(),
            },
            EventPayload::NodesClaimed {
                node_ids: vec![nid("1.1"), nid("1.2")],
                owner: "prover-a".into(),
                timeout_secs: 3600,
                acquired_at: ts(),
            },
            EventPayload::NodesReleased {
                node_ids: vec![nid("1.1")],
            },
            EventPayload::NodeValidated { node_id: nid("1") },
            EventPayload::NodeAdmitted { node_id: nid("1.1") },
            EventPayload::NodeRefuted {
                node_id: nid("1.2"),
                reason: Some("counterexample at n=2".into()),
            },
            EventPayload::NodeArchived { node_id: nid("1.2") },
            EventPayload::NodeRefinementRequested {
                node_id: nid("1"),
                reason: "missing base case".into(),
                agent: "verifier-b".into(),
            },
            EventPayload::ChallengeRaised {
                challenge_id: "ch-1".into(),
                node_id: nid("1.1"),
                target: ChallengeTarget::Statement,
                reason: "ambiguous".into(),
                raised_by: Some("verifier-b".into()),
            },
            EventPayload::ChallengeResolved {
                challenge_id: "ch-1".into(),
                response: Some("clarified".into()),
            },
            EventPayload::ChallengeWithdrawn {
                challenge_id: "ch-2".into(),
            },
            EventPayload::ChallengeSuperseded {
                old_id: "ch-1".into(),
                new_id: "ch-3".into(),
            },
            EventPayload::AssumptionAdded {
                assumption: Assumption::new("n > 0".into(), None, ts()),
            },
            EventPayload::TaintRecomputed {
                node_id: nid("1.1.1"),
                new_taint: TaintState::Tainted,
            },
            EventPayload::LemmaExtracted {
                node_id: nid("1.2"),
                statement: "S".into(),
            },
            EventPayload::LockReaped {
                node_id: nid("1.1"),
                owner: "prover-a".into(),
                expired_at: ts(),
            },
        ]
    }

    #[test]
    fn payloads_cover_every_kind() {
        let payloads = all_payloads();
        assert_eq!(payloads.len(), EventKind::ALL.len());
        for (payload, kind) in payloads.iter().zip(EventKind::ALL) {
            assert_eq!(payload.kind(), kind);
        }
    }

    #[test]
    fn serde_roundtrip_all_kinds() {
        for (i, payload) in all_payloads().into_iter().enumerate() {
            let event = Event {
                seq: u64::try_from(i).expect("small index") + 1,
                timestamp: ts(),
                payload,
            };
            let json = serde_json::to_string(&event).expect("serialize");
            let back: Event = serde_json::from_str(&json).expect("deserialize");
            assert_eq!(back, event, "roundtrip failed for {}", event.kind());
        }
    }

    #[test]
    fn wire_form_is_flat_and_tagged() {
        let event = Event {
            seq: 3,
            timestamp: ts(),
            payload: EventPayload::NodeValidated { node_id: nid("1") },
        };
        let value: serde_json::Value =
            serde_json::to_value(&event).expect("serialize");
        assert_eq!(value["seq"], 3);
        assert_eq!(value["type"], "node_validated");
        assert_eq!(value["node_id"], "1");
        assert!(value.get("payload").is_none(), "payload must be flattened");
    }

    #[test]
    fn timestamp_keeps_nanoseconds() {
        let event = Event {
            seq: 1,
            timestamp: ts(),
            payload: EventPayload::NodeValidated { node_id: nid("1") },
        };
        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.contains("2026-07-30T12:00:00.000000001"));
    }

    #[test]
    fn serialized_events_are_one_line() {
        for payload in all_payloads() {
            let event = Event { seq: 1, timestamp: ts(), payload };
            let json = serde_json::to_string(&event).expect("serialize");
            assert!(!json.contains('\n'), "newline in wire form of {}", event.kind());
        }
    }

    #[test]
    fn optional_reason_omitted_when_absent() {
        let event = Event {
            seq: 1,
            timestamp: ts(),
            payload: EventPayload::NodeRefuted {
                node_id: nid("1"),
                reason: None,
            },
        };
        let json = serde_json::to_string(&event).expect("serialize");
        assert!(!json.contains("reason"));
    }

    #[test]
    fn node_ids_for_history_filtering() {
        assert_eq!(
            EventPayload::ProofInitialized {
                conjecture: "C".into(),
                author: "a".into(),
                created_at: ts(),
            }
            .node_ids(),
            vec![NodeId::root()]
        );
        assert_eq!(
            EventPayload::NodesClaimed {
                node_ids: vec![nid("1.1"), nid("1.2")],
                owner: "p".into(),
                timeout_secs: 60,
                acquired_at: ts(),
            }
            .node_ids()
            .len(),
            2
        );
        assert!(
            EventPayload::ChallengeResolved {
                challenge_id: "ch-1".into(),
                response: None,
            }
            .node_ids()
            .is_empty(),
            "challenge status events resolve to nodes via the projection index"
        );
    }

    #[test]
    fn challenge_ids_extraction() {
        let superseded = EventPayload::ChallengeSuperseded {
            old_id: "ch-1".into(),
            new_id: "ch-2".into(),
        };
        assert_eq!(superseded.challenge_ids(), vec!["ch-1", "ch-2"]);
    }

    #[test]
    fn display_is_compact() {
        let event = Event {
            seq: 7,
            timestamp: ts(),
            payload: EventPayload::ChallengeRaised {
                challenge_id: "ch-9".into(),
                node_id: nid("1.2"),
                target: ChallengeTarget::Gap,
                reason: "missing step".into(),
                raised_by: None,
            },
        };
        let shown = event.to_string();
        assert!(shown.contains("#7"));
        assert!(shown.contains("challenge_raised"));
        assert!(shown.contains("ch-9"));
        assert!(shown.contains("1.2"));
        assert!(shown.contains("gap"));
    }
}
