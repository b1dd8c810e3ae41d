//! Command handlers. One module per surface area; each handler validates
//! its inputs, drives the workbench, and renders via the shared output
//! layer.

pub mod assume;
pub mod challenge;
pub mod claim;
pub mod health;
pub mod history;
pub mod init;
pub mod jobs;
pub mod refine;
pub mod status;
pub mod taint;
pub mod verdict;

use crate::output::OutputMode;
use lemma_core::Workbench;
use lemma_core::error::{InputError, Result};
use lemma_core::model::node_id::NodeId;
use std::path::PathBuf;

/// Per-invocation context shared by every handler.
pub struct Ctx {
    pub mode: OutputMode,
    pub agent: String,
    pub root: PathBuf,
}

impl Ctx {
    /// Open the workbench at the configured root.
    pub fn workbench(&self) -> Result<Workbench> {
        Workbench::open(&self.root)
    }
}

/// Parse a list of node-id arguments.
pub fn parse_node_ids(raw: &[String]) -> Result<Vec<NodeId>> {
    raw.iter().map(|s| Ok(s.parse::<NodeId>()?)).collect()
}

/// Parse one node-id argument.
pub fn parse_node_id(raw: &str) -> Result<NodeId> {
    Ok(raw.parse::<NodeId>()?)
}

/// Reject blank required text inputs before they reach the core.
pub fn non_empty(value: &str, field: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(InputError::EmptyField { field }.into());
    }
    Ok(())
}
