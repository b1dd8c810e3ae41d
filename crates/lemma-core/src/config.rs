//! Workspace configuration.
//!
//! Loaded from `<root>/config.toml` when present; every section and field
//! falls back to defaults, so a missing or empty file is fine. The main
//! knob is the challenge blocking policy: which challenge targets prevent
//! acceptance of a node while open.

use crate::model::challenge::ChallengeTarget;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Filename of the optional config file inside the workspace root.
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorkbenchConfig {
    #[serde(default)]
    pub challenges: ChallengeConfig,
    #[serde(default)]
    pub claims: ClaimConfig,
    #[serde(default)]
    pub locking: LockingConfig,
}

/// Per-target challenge policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeConfig {
    /// Targets whose open challenges block `accept`.
    ///
    /// Context, dependencies, and scope challenges are informational by
    /// default: they surface in job priorities but do not gate acceptance.
    #[serde(default = "default_blocking_targets")]
    pub blocking: Vec<ChallengeTarget>,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            blocking: default_blocking_targets(),
        }
    }
}

impl ChallengeConfig {
    /// Whether an open challenge with this target blocks acceptance.
    #[must_use]
    pub fn is_blocking(&self, target: ChallengeTarget) -> bool {
        self.blocking.contains(&target)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimConfig {
    /// Claim timeout used when the caller does not supply one.
    #[serde(default = "default_claim_timeout_secs")]
    pub default_timeout_secs: u64,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: default_claim_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockingConfig {
    /// How long to wait for the directory lock before failing.
    #[serde(default = "default_lock_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for LockingConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl LockingConfig {
    /// The lock acquisition timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_blocking_targets() -> Vec<ChallengeTarget> {
    vec![
        ChallengeTarget::Statement,
        ChallengeTarget::Inference,
        ChallengeTarget::Gap,
        ChallengeTarget::TypeError,
        ChallengeTarget::Domain,
    ]
}

const fn default_claim_timeout_secs() -> u64 {
    3600
}

const fn default_lock_timeout_ms() -> u64 {
    5000
}

/// Load the workspace config, falling back to defaults when the file is
/// absent.
///
/// # Errors
///
/// Fails when the file exists but cannot be read or parsed.
pub fn load(root: &Path) -> Result<WorkbenchConfig> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(WorkbenchConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<WorkbenchConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}
