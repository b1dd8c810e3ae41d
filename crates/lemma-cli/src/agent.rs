//! Agent identity resolution.
//!
//! Precedence: `--agent` flag > `LM_AGENT` env var > `USER` env var >
//! `"anonymous"`. Both prover and verifier roles use the same identity; the
//! role is implied by the operation.

/// Resolve the acting agent's identity.
#[must_use]
pub fn resolve(flag: Option<&str>) -> String {
    if let Some(agent) = flag {
        return agent.to_string();
    }
    if let Ok(agent) = std::env::var("LM_AGENT") {
        if !agent.trim().is_empty() {
            return agent;
        }
    }
    if let Ok(user) = std::env::var("USER") {
        if !user.trim().is_empty() {
            return user;
        }
    }
    "anonymous".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins() {
        assert_eq!(resolve(Some("prover-a")), "prover-a");
    }

    #[test]
    fn fallback_is_never_empty() {
        assert!(!resolve(None).is_empty());
    }
}
