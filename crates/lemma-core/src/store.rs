//! Assumption side-store: one write-once JSON file per assumption.
//!
//! The ledger remains authoritative (every assumption is also an
//! `assumption_added` event); the side-store exists so agents can read a
//! single assumption by id without replaying, and so assumption text
//! survives even if a future tool compacts the ledger. Files are
//! content-addressed by statement hash, which makes duplicate saves
//! naturally idempotent.

use crate::error::{PersistenceError, Result, StructuralError};
use crate::model::assumption::Assumption;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory under the workspace root holding assumption records.
pub const ASSUMPTIONS_DIR: &str = "assumptions";

/// Handle to the assumption directory of one workspace.
#[derive(Debug, Clone)]
pub struct AssumptionStore {
    dir: PathBuf,
}

impl AssumptionStore {
    /// Handle to the store of `root` without touching the filesystem.
    #[must_use]
    pub fn open(root: &Path) -> Self {
        Self {
            dir: root.join(ASSUMPTIONS_DIR),
        }
    }

    /// Create the assumptions directory if missing.
    ///
    /// # Errors
    ///
    /// Fails on filesystem errors.
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| self.io(&e.to_string()))?;
        Ok(())
    }

    /// Persist an assumption. Returns `false` when the record already
    /// existed (identical content, by construction of the id).
    ///
    /// # Errors
    ///
    /// Fails on serialization or filesystem errors.
    pub fn save(&self, assumption: &Assumption) -> Result<bool> {
        self.ensure()?;
        let path = self.dir.join(&assumption.id);
        if path.exists() {
            return Ok(false);
        }
        let json = serde_json::to_string_pretty(assumption).map_err(|e| {
            PersistenceError::Serialize {
                reason: e.to_string(),
            }
        })?;
        fs::write(&path, json).map_err(|e| self.io(&e.to_string()))?;
        debug!(id = %assumption.id, "assumption saved");
        Ok(true)
    }

    /// List all stored assumptions in id order.
    ///
    /// # Errors
    ///
    /// Fails on filesystem or parse errors.
    pub fn list(&self) -> Result<Vec<Assumption>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut assumptions = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(|e| self.io(&e.to_string()))? {
            let entry = entry.map_err(|e| self.io(&e.to_string()))?;
            let content =
                fs::read_to_string(entry.path()).map_err(|e| self.io(&e.to_string()))?;
            let assumption: Assumption =
                serde_json::from_str(&content).map_err(|e| PersistenceError::LedgerIntegrity {
                    reason: format!(
                        "assumption file {} is corrupt: {e}",
                        entry.path().display()
                    ),
                })?;
            assumptions.push(assumption);
        }
        assumptions.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(assumptions)
    }

    /// Look up one assumption by id prefix.
    ///
    /// # Errors
    ///
    /// `assumption_not_found` when nothing matches; `assumption_ambiguous`
    /// (listing the candidates) when more than one record matches.
    pub fn find_by_prefix(&self, prefix: &str) -> Result<Assumption> {
        let mut matches: Vec<Assumption> = self
            .list()?
            .into_iter()
            .filter(|a| a.id.starts_with(prefix))
            .collect();
        match matches.len() {
            0 => Err(StructuralError::AssumptionNotFound {
                prefix: prefix.to_string(),
            }
            .into()),
            1 => Ok(matches.remove(0)),
            _ => Err(StructuralError::AssumptionAmbiguous {
                prefix: prefix.to_string(),
                matches: matches.into_iter().map(|a| a.id).collect(),
            }
            .into()),
        }
    }

    fn io(&self, reason: &str) -> PersistenceError {
        PersistenceError::Io {
            path: self.dir.clone(),
            reason: reason.to_string(),
        }
    }
}
