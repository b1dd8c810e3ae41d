//! Claim records: temporary exclusive assignment of nodes to agents.
//!
//! A claim is contained in node state (`claimed_by`/`claim_deadline`) but
//! tracked separately in the projection so the reaper can enumerate expiring
//! locks without walking every node.

use crate::model::node_id::NodeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An active lock on one node. At most one exists per node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub node_id: NodeId,
    pub owner: String,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Claim {
    /// Whether the claim has expired as of `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
