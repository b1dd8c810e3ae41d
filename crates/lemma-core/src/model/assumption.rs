//! Globally-scoped assumptions.
//!
//! An assumption is an axiom-like statement available to every node. Its
//! identity is derived from a BLAKE3 hash of the statement text, so the same
//! statement always maps to the same id and duplicate inserts are idempotent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hex digits of the content hash used in the short `as-<hex>` id.
const ID_HEX_LEN: usize = 16;

/// A globally-scoped axiom-like statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assumption {
    /// Stable id, `as-<first 16 hex of blake3(statement)>`.
    pub id: String,
    pub statement: String,
    /// Full content hash, `blake3:<hex>`.
    pub content_hash: String,
    pub justification: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Assumption {
    /// Build an assumption from its statement, deriving id and hash.
    #[must_use]
    pub fn new(statement: String, justification: Option<String>, created_at: DateTime<Utc>) -> Self {
        let hash = blake3::hash(statement.as_bytes());
        let hex = hash.to_hex();
        Self {
            id: format!("as-{}", &hex.as_str()[..ID_HEX_LEN]),
            statement,
            content_hash: format!("blake3:{hex}"),
            justification,
            created_at,
        }
    }

    /// The id the given statement would hash to.
    #[must_use]
    pub fn id_for(statement: &str) -> String {
        let hex = blake3::hash(statement.as_bytes()).to_hex();
        format!("as-{}", &hex.as_str()[..ID_HEX_LEN])
    }
}
