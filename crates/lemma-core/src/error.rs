//! Error types for lemma-core.
//!
//! Errors are organized into four categories matching the failure surfaces
//! of the engine: input validation, structural lookups, state-machine
//! violations, and persistence. Every variant carries a machine-stable
//! `error_kind` (snake_case) for `--format json` consumers and a human
//! `Error:/Cause:/Fix:` message with an actionable suggestion.

use crate::model::challenge::ChallengeStatus;
use crate::model::node::{EpistemicState, WorkflowState};
use crate::model::node_id::{NodeId, ParseNodeIdError};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LemmaError>;

// ---------------------------------------------------------------------------
// Top-level LemmaError
// ---------------------------------------------------------------------------

/// Top-level error type for all lemma-core operations.
///
/// Each variant delegates to a category-specific enum that carries the
/// contextual details. Use [`error_kind()`](LemmaError::error_kind) for the
/// machine-stable kind and [`suggestion()`](LemmaError::suggestion) for a
/// remediation hint.
#[derive(Debug, thiserror::Error)]
pub enum LemmaError {
    /// Malformed caller input (node ids, empty fields).
    #[error(transparent)]
    Input(#[from] InputError),

    /// Lookups against the projection that found nothing (or too much).
    #[error(transparent)]
    Structural(#[from] StructuralError),

    /// State-machine violations (epistemic, workflow, challenge status).
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Ledger, filesystem, and locking failures.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl LemmaError {
    /// Machine-stable error kind for JSON output (e.g. `"wrong_owner"`).
    #[must_use]
    pub const fn error_kind(&self) -> &'static str {
        match self {
            Self::Input(e) => e.error_kind(),
            Self::Structural(e) => e.error_kind(),
            Self::Transition(e) => e.error_kind(),
            Self::Persistence(e) => e.error_kind(),
        }
    }

    /// Human-readable suggestion for how to proceed.
    #[must_use]
    pub fn suggestion(&self) -> String {
        match self {
            Self::Input(e) => e.suggestion(),
            Self::Structural(e) => e.suggestion(),
            Self::Transition(e) => e.suggestion(),
            Self::Persistence(e) => e.suggestion(),
        }
    }

    /// Structured error payload for JSON serialization.
    #[must_use]
    pub fn to_json_error(&self) -> JsonError {
        JsonError {
            error_kind: self.error_kind().to_string(),
            message: self.to_string(),
            suggestion: self.suggestion(),
        }
    }
}

/// JSON-serializable error payload for `--format json` mode.
#[derive(Debug, Clone, Serialize)]
pub struct JsonError {
    /// Machine-stable error kind (e.g. `"node_not_found"`).
    pub error_kind: String,
    /// Human-readable error message.
    pub message: String,
    /// Actionable suggestion.
    pub suggestion: String,
}

// ---------------------------------------------------------------------------
// InputError
// ---------------------------------------------------------------------------

/// Malformed caller input.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// A node id string failed to parse.
    #[error(
        "Error: Invalid node id '{raw}'\nCause: {reason}\nFix: Node ids are dot-separated positive integers rooted at 1, e.g. '1', '1.2', '1.1.3'."
    )]
    InvalidNodeId {
        /// The rejected input.
        raw: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A value did not match its expected format.
    #[error(
        "Error: Invalid {what} '{raw}'\nCause: {reason}\nFix: Check the value format and retry."
    )]
    InvalidFormat {
        /// Which input was malformed (e.g. "challenge target").
        what: &'static str,
        /// The rejected input.
        raw: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A required free-text field was empty.
    #[error(
        "Error: Empty {field}\nCause: The {field} must be non-empty\nFix: Supply a non-empty {field} and retry."
    )]
    EmptyField {
        /// The offending field name.
        field: &'static str,
    },
}

impl InputError {
    /// Machine-stable error kind.
    #[must_use]
    pub const fn error_kind(&self) -> &'static str {
        match self {
            Self::InvalidNodeId { .. } => "invalid_node_id",
            Self::InvalidFormat { .. } => "invalid_format",
            Self::EmptyField { .. } => "empty_field",
        }
    }

    /// Human-readable suggestion.
    #[must_use]
    pub fn suggestion(&self) -> String {
        match self {
            Self::InvalidNodeId { .. } => {
                "Node ids are dot-separated positive integers rooted at 1.".into()
            }
            Self::InvalidFormat { what, .. } => format!("Check the {what} format and retry."),
            Self::EmptyField { field } => format!("Supply a non-empty {field}."),
        }
    }
}

// ---------------------------------------------------------------------------
// StructuralError
// ---------------------------------------------------------------------------

/// Lookups that found nothing (or too much).
#[derive(Debug, thiserror::Error)]
pub enum StructuralError {
    /// The directory holds no initialized proof.
    #[error(
        "Error: No proof at {path}\nCause: The ledger is empty or missing\nFix: Run `lm init` to start a proof in this directory."
    )]
    NotInitialized {
        /// The directory that was checked.
        path: PathBuf,
    },

    /// `init` was attempted on a non-empty ledger.
    #[error(
        "Error: Proof already initialized at {path}\nCause: The ledger already contains events\nFix: Use a fresh directory, or continue working on the existing proof."
    )]
    AlreadyInitialized {
        /// The directory holding the existing proof.
        path: PathBuf,
    },

    /// The referenced node does not exist in the projection.
    #[error(
        "Error: Node '{node_id}' not found\nCause: No node with this id exists in the proof tree\nFix: Check the id. Use `lm status` to list known nodes."
    )]
    NodeNotFound {
        /// The id that was not found.
        node_id: NodeId,
    },

    /// The referenced challenge does not exist.
    #[error(
        "Error: Challenge '{challenge_id}' not found\nCause: No challenge with this id exists\nFix: Check the id. Use `lm status` to list open challenges."
    )]
    ChallengeNotFound {
        /// The id that was not found.
        challenge_id: String,
    },

    /// An assumption id prefix matched more than one record.
    #[error("Error: Ambiguous assumption prefix '{prefix}' matches {} records\nCause: The prefix is too short to identify one assumption\nFix: Use a longer prefix. Matching: {}", matches.len(), matches.join(", "))]
    AssumptionAmbiguous {
        /// The ambiguous prefix.
        prefix: String,
        /// The matching assumption ids.
        matches: Vec<String>,
    },

    /// No assumption matched the given prefix.
    #[error(
        "Error: No assumption matches '{prefix}'\nCause: No stored assumption id starts with this prefix\nFix: Use `lm assumptions` to list stored assumptions."
    )]
    AssumptionNotFound {
        /// The prefix that matched nothing.
        prefix: String,
    },
}

impl StructuralError {
    /// Machine-stable error kind.
    #[must_use]
    pub const fn error_kind(&self) -> &'static str {
        match self {
            Self::NotInitialized { .. } => "not_initialized",
            Self::AlreadyInitialized { .. } => "already_initialized",
            Self::NodeNotFound { .. } => "node_not_found",
            Self::ChallengeNotFound { .. } => "challenge_not_found",
            Self::AssumptionAmbiguous { .. } => "assumption_ambiguous",
            Self::AssumptionNotFound { .. } => "assumption_not_found",
        }
    }

    /// Human-readable suggestion.
    #[must_use]
    pub fn suggestion(&self) -> String {
        match self {
            Self::NotInitialized { .. } => "Run `lm init` to start a proof.".into(),
            Self::AlreadyInitialized { .. } => {
                "Use a fresh directory for a new proof.".into()
            }
            Self::NodeNotFound { .. } => {
                "Check the node id. Use `lm status` to list known nodes.".into()
            }
            Self::ChallengeNotFound { .. } => {
                "Check the challenge id. Use `lm status` to list open challenges.".into()
            }
            Self::AssumptionAmbiguous { prefix, .. } => {
                format!("Use a longer prefix than '{prefix}'.")
            }
            Self::AssumptionNotFound { .. } => {
                "Use `lm assumptions` to list stored assumptions.".into()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TransitionError
// ---------------------------------------------------------------------------

/// State-machine violations.
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    /// The node's epistemic state does not admit the operation.
    #[error(
        "Error: Node '{node_id}' is '{found}', operation requires '{required}'\nCause: The epistemic state machine does not allow this transition\nFix: Valid flow: pending -> validated|admitted|refuted; validated -> needs_refinement|archived; needs_refinement -> validated."
    )]
    WrongEpistemicState {
        node_id: NodeId,
        found: EpistemicState,
        /// Human description of the acceptable states.
        required: &'static str,
    },

    /// The node's workflow state does not admit the operation.
    #[error(
        "Error: Node '{node_id}' is '{found}', operation requires '{required}'\nCause: The workflow state does not allow this operation\nFix: Claim the node first, or wait for the current claim to expire."
    )]
    WrongWorkflowState {
        node_id: NodeId,
        found: WorkflowState,
        required: WorkflowState,
    },

    /// The operation requires a claim the caller does not hold.
    #[error(
        "Error: Node '{node_id}' is not claimed\nCause: This operation requires the caller to hold the node\nFix: Run `lm claim {node_id}` first."
    )]
    NotClaimed { node_id: NodeId },

    /// The node is claimed by a different agent.
    #[error(
        "Error: Node '{node_id}' is claimed by '{actual}', not '{supplied}'\nCause: Only the claim owner may perform this operation\nFix: Wait for the claim to expire or ask '{actual}' to release it."
    )]
    WrongOwner {
        node_id: NodeId,
        /// The agent actually holding the claim.
        actual: String,
        /// The agent that attempted the operation.
        supplied: String,
    },

    /// The challenge is not open.
    #[error(
        "Error: Challenge '{challenge_id}' is '{status}'\nCause: Only open challenges can be resolved, withdrawn, or superseded\nFix: Nothing to do; the challenge is already settled."
    )]
    ChallengeNotOpen {
        challenge_id: String,
        status: ChallengeStatus,
    },

    /// Acceptance was attempted while a blocking challenge is open.
    #[error("Error: Node '{node_id}' has open blocking challenges: {}\nCause: A node cannot be accepted while blocking challenges are open\nFix: Resolve or withdraw the challenges first.", challenge_ids.join(", "))]
    ChallengeStillOpen {
        node_id: NodeId,
        /// Ids of the open blocking challenges.
        challenge_ids: Vec<String>,
    },
}

impl TransitionError {
    /// Machine-stable error kind.
    #[must_use]
    pub const fn error_kind(&self) -> &'static str {
        match self {
            Self::WrongEpistemicState { .. } => "wrong_epistemic_state",
            Self::WrongWorkflowState { .. } => "wrong_workflow_state",
            Self::NotClaimed { .. } => "not_claimed",
            Self::WrongOwner { .. } => "wrong_owner",
            Self::ChallengeNotOpen { .. } => "challenge_not_open",
            Self::ChallengeStillOpen { .. } => "challenge_still_open",
        }
    }

    /// Human-readable suggestion.
    #[must_use]
    pub fn suggestion(&self) -> String {
        match self {
            Self::WrongEpistemicState { .. } => {
                "Check `lm show <id>` for the node's current state.".into()
            }
            Self::WrongWorkflowState { .. } | Self::NotClaimed { .. } => {
                "Claim the node first with `lm claim <id>`.".into()
            }
            Self::WrongOwner { actual, .. } => {
                format!("Wait for the claim to expire or ask '{actual}' to release it.")
            }
            Self::ChallengeNotOpen { .. } => "The challenge is already settled.".into(),
            Self::ChallengeStillOpen { .. } => {
                "Resolve or withdraw the open challenges first.".into()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// PersistenceError
// ---------------------------------------------------------------------------

/// Ledger, filesystem, and locking failures.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// A committed (non-trailing) ledger record is corrupt, or replay hit a
    /// structural inconsistency.
    #[error(
        "Error: Ledger integrity violation\nCause: {reason}\nFix: The ledger is append-only; restore it from backup. Do not edit records in place."
    )]
    LedgerIntegrity {
        /// Description of the corruption.
        reason: String,
    },

    /// The ledger was written by a newer version of lemma.
    #[error(
        "Error: Unsupported ledger version\nCause: {reason}\nFix: Upgrade lemma to read this ledger."
    )]
    VersionMismatch {
        /// Description including the found and supported versions.
        reason: String,
    },

    /// A filesystem operation failed.
    #[error(
        "Error: I/O error at {path}\nCause: {reason}\nFix: Check that the path exists and is writable; verify disk space and permissions."
    )]
    Io {
        /// The path involved.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// The exclusive directory lock could not be acquired in time.
    #[error(
        "Error: Lock timed out after {waited:?} at {path}\nCause: Another lemma process is holding the directory lock\nFix: Retry after the other process finishes. Check for stale lock files."
    )]
    LockTimeout {
        /// The lock file path.
        path: PathBuf,
        /// How long acquisition was attempted.
        waited: Duration,
    },

    /// Event serialization failed.
    #[error(
        "Error: Failed to serialize event\nCause: {reason}\nFix: This is a bug in lemma; report it with the command that triggered it."
    )]
    Serialize {
        /// Description of the failure.
        reason: String,
    },
}

impl PersistenceError {
    /// Machine-stable error kind.
    #[must_use]
    pub const fn error_kind(&self) -> &'static str {
        match self {
            Self::LedgerIntegrity { .. } => "ledger_integrity",
            Self::VersionMismatch { .. } => "version_mismatch",
            Self::Io { .. } => "io_error",
            Self::LockTimeout { .. } => "lock_timeout",
            Self::Serialize { .. } => "serialize_failed",
        }
    }

    /// Human-readable suggestion.
    #[must_use]
    pub fn suggestion(&self) -> String {
        match self {
            Self::LedgerIntegrity { .. } => {
                "Restore the ledger from backup; records are never edited in place.".into()
            }
            Self::VersionMismatch { .. } => "Upgrade lemma to read this ledger.".into(),
            Self::Io { .. } => "Check path, permissions, and disk space.".into(),
            Self::LockTimeout { .. } => {
                "Retry after the other lemma process releases the lock.".into()
            }
            Self::Serialize { .. } => "Report a bug with the triggering command.".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// From implementations for common error types
// ---------------------------------------------------------------------------

impl From<ParseNodeIdError> for LemmaError {
    fn from(err: ParseNodeIdError) -> Self {
        Self::Input(InputError::InvalidNodeId {
            raw: err.raw,
            reason: err.reason.to_string(),
        })
    }
}

impl From<std::io::Error> for LemmaError {
    fn from(err: std::io::Error) -> Self {
        Self::Persistence(PersistenceError::Io {
            path: PathBuf::from("<unknown>"),
            reason: err.to_string(),
        })
    }
}

impl From<serde_json::Error> for LemmaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Persistence(PersistenceError::Serialize {
            reason: err.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn representative_errors() -> Vec<LemmaError> {
        vec![
            InputError::InvalidNodeId {
                raw: "2.1".into(),
                reason: "root component must be 1".into(),
            }
            .into(),
            InputError::InvalidFormat {
                what: "challenge target",
                raw: "typo".into(),
                reason: "unknown target".into(),
            }
            .into(),
            InputError::EmptyField { field: "statement" }.into(),
            StructuralError::NotInitialized {
                path: PathBuf::from("/tmp/proof"),
            }
            .into(),
            StructuralError::AlreadyInitialized {
                path: PathBuf::from("/tmp/proof"),
            }
            .into(),
            StructuralError::NodeNotFound {
                node_id: NodeId::root(),
            }
            .into(),
            StructuralError::ChallengeNotFound {
                challenge_id: "ch-9".into(),
            }
            .into(),
            StructuralError::AssumptionAmbiguous {
                prefix: "as-1".into(),
                matches: vec!["as-1a".into(), "as-1b".into()],
            }
            .into(),
            StructuralError::AssumptionNotFound {
                prefix: "as-ff".into(),
            }
            .into(),
            TransitionError::WrongEpistemicState {
                node_id: NodeId::root(),
                found: EpistemicState::Archived,
                required: "pending",
            }
            .into(),
            TransitionError::WrongWorkflowState {
                node_id: NodeId::root(),
                found: WorkflowState::Claimed,
                required: WorkflowState::Available,
            }
            .into(),
            TransitionError::NotClaimed {
                node_id: NodeId::root(),
            }
            .into(),
            TransitionError::WrongOwner {
                node_id: NodeId::root(),
                actual: "A".into(),
                supplied: "B".into(),
            }
            .into(),
            TransitionError::ChallengeNotOpen {
                challenge_id: "ch-1".into(),
                status: ChallengeStatus::Resolved,
            }
            .into(),
            TransitionError::ChallengeStillOpen {
                node_id: NodeId::root(),
                challenge_ids: vec!["ch-1".into(), "ch-2".into()],
            }
            .into(),
            PersistenceError::LedgerIntegrity {
                reason: "node_created references missing parent".into(),
            }
            .into(),
            PersistenceError::VersionMismatch {
                reason: "ledger v9, supports up to v1".into(),
            }
            .into(),
            PersistenceError::Io {
                path: PathBuf::from("/tmp/x"),
                reason: "permission denied".into(),
            }
            .into(),
            PersistenceError::LockTimeout {
                path: PathBuf::from("/tmp/.lock"),
                waited: Duration::from_secs(5),
            }
            .into(),
            PersistenceError::Serialize {
                reason: "bad value".into(),
            }
            .into(),
        ]
    }

    #[test]
    fn error_kinds_are_unique_and_snake_case() {
        let mut seen = HashSet::new();
        for err in representative_errors() {
            let kind = err.error_kind();
            assert!(seen.insert(kind), "duplicate kind {kind}");
            assert!(
                kind.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "kind '{kind}' is not snake_case"
            );
        }
    }

    #[test]
    fn every_error_has_message_and_suggestion() {
        for err in representative_errors() {
            assert!(!err.to_string().is_empty(), "{err:?} has empty display");
            assert!(!err.suggestion().is_empty(), "{err:?} has empty suggestion");
        }
    }

    #[test]
    fn display_has_error_cause_fix_shape() {
        let err: LemmaError = TransitionError::WrongOwner {
            node_id: NodeId::root(),
            actual: "prover-a".into(),
            supplied: "prover-b".into(),
        }
        .into();
        let msg = err.to_string();
        assert!(msg.contains("Error:"));
        assert!(msg.contains("Cause:"));
        assert!(msg.contains("Fix:"));
        assert!(msg.contains("prover-a"));
        assert!(msg.contains("prover-b"));
    }

    #[test]
    fn wrong_epistemic_state_names_both_states() {
        let err: LemmaError = TransitionError::WrongEpistemicState {
            node_id: "1.2".parse().expect("valid id"),
            found: EpistemicState::Refuted,
            required: "pending",
        }
        .into();
        let msg = err.to_string();
        assert!(msg.contains("1.2"));
        assert!(msg.contains("refuted"));
        assert!(msg.contains("pending"));
        assert_eq!(err.error_kind(), "wrong_epistemic_state");
    }

    #[test]
    fn challenge_not_open_carries_status() {
        let err: LemmaError = TransitionError::ChallengeNotOpen {
            challenge_id: "ch-1".into(),
            status: ChallengeStatus::Resolved,
        }
        .into();
        assert!(err.to_string().contains("resolved"));
        assert_eq!(err.error_kind(), "challenge_not_open");
    }

    #[test]
    fn json_error_payload_is_stable() {
        let err: LemmaError = StructuralError::NodeNotFound {
            node_id: "1.3".parse().expect("valid id"),
        }
        .into();
        let json = err.to_json_error();
        assert_eq!(json.error_kind, "node_not_found");
        assert!(json.message.contains("1.3"));

        let value = serde_json::to_value(&json).expect("serialize");
        assert!(value["error_kind"].is_string());
        assert!(value["message"].is_string());
        assert!(value["suggestion"].is_string());
    }

    #[test]
    fn parse_node_id_error_converts_to_input_error() {
        let parse_err = "1..2".parse::<NodeId>().unwrap_err();
        let err: LemmaError = parse_err.into();
        assert_eq!(err.error_kind(), "invalid_node_id");
        assert!(err.to_string().contains("1..2"));
    }

    #[test]
    fn io_error_converts_to_persistence() {
        let io_err = std::io::Error::other("disk on fire");
        let err: LemmaError = io_err.into();
        assert_eq!(err.error_kind(), "io_error");
        assert!(err.to_string().contains("disk on fire"));
    }

    #[test]
    fn assumption_ambiguous_lists_candidates() {
        let err: LemmaError = StructuralError::AssumptionAmbiguous {
            prefix: "as-a".into(),
            matches: vec!["as-a1".into(), "as-a2".into(), "as-a3".into()],
        }
        .into();
        let msg = err.to_string();
        assert!(msg.contains("3 records"));
        assert!(msg.contains("as-a2"));
    }
}
