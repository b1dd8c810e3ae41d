//! Challenges: objections raised by verifiers against a node.

use crate::model::node_id::NodeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The aspect of a node a challenge objects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeTarget {
    Statement,
    Inference,
    Context,
    Dependencies,
    Scope,
    Gap,
    TypeError,
    Domain,
}

impl ChallengeTarget {
    /// All targets in catalog order.
    pub const ALL: [Self; 8] = [
        Self::Statement,
        Self::Inference,
        Self::Context,
        Self::Dependencies,
        Self::Scope,
        Self::Gap,
        Self::TypeError,
        Self::Domain,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Statement => "statement",
            Self::Inference => "inference",
            Self::Context => "context",
            Self::Dependencies => "dependencies",
            Self::Scope => "scope",
            Self::Gap => "gap",
            Self::TypeError => "type_error",
            Self::Domain => "domain",
        }
    }
}

/// Error returned when parsing an unknown challenge target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTarget {
    pub raw: String,
}

impl fmt::Display for UnknownTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown challenge target '{}': expected one of statement, inference, context, \
             dependencies, scope, gap, type_error, domain",
            self.raw
        )
    }
}

impl std::error::Error for UnknownTarget {}

impl FromStr for ChallengeTarget {
    type Err = UnknownTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "statement" => Ok(Self::Statement),
            "inference" => Ok(Self::Inference),
            "context" => Ok(Self::Context),
            "dependencies" => Ok(Self::Dependencies),
            "scope" => Ok(Self::Scope),
            "gap" => Ok(Self::Gap),
            "type_error" => Ok(Self::TypeError),
            "domain" => Ok(Self::Domain),
            _ => Err(UnknownTarget { raw: s.to_string() }),
        }
    }
}

impl fmt::Display for ChallengeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a challenge. `Open` is the only non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    Open,
    Resolved,
    Withdrawn,
    Superseded,
}

impl ChallengeStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Resolved => "resolved",
            Self::Withdrawn => "withdrawn",
            Self::Superseded => "superseded",
        }
    }

    /// Whether the challenge still demands attention.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An objection raised against one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Opaque identifier (`ch-<hex>` when generated).
    pub id: String,
    pub node_id: NodeId,
    pub target: ChallengeTarget,
    pub reason: String,
    pub status: ChallengeStatus,
    pub raised_at: DateTime<Utc>,
    /// Agent that raised the challenge, when known.
    pub raised_by: Option<String>,
}

impl Challenge {
    /// Build a fresh open challenge.
    #[must_use]
    pub fn new(
        id: String,
        node_id: NodeId,
        target: ChallengeTarget,
        reason: String,
        raised_by: Option<String>,
        raised_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            node_id,
            target,
            reason,
            status: ChallengeStatus::Open,
            raised_at,
            raised_by,
        }
    }
}
