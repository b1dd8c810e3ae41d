//! Hierarchical node identifiers for the proof tree.
//!
//! A [`NodeId`] is a non-empty path of positive integers rendered as
//! dot-separated decimals (`1`, `1.2`, `1.1.1.1`). The first component is
//! always `1` (the conjecture node). Children extend the parent path by one
//! component, so ancestry is a path-prefix test and no back-pointers are
//! needed anywhere in the tree.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A path-shaped identifier for one node in the proof tree.
///
/// Ordering is lexicographic on the component path (`1.2` < `1.10`), which
/// makes sorted node listings read as a pre-order walk of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Vec<u32>);

/// Error returned when parsing a malformed node id string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNodeIdError {
    /// The rejected input string.
    pub raw: String,
    /// What was wrong with it.
    pub reason: &'static str,
}

impl fmt::Display for ParseNodeIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid node id '{}': {} (expected dot-separated positive integers rooted at 1, \
             e.g. '1', '1.2', '1.1.3')",
            self.raw, self.reason
        )
    }
}

impl std::error::Error for ParseNodeIdError {}

impl NodeId {
    /// The root node id `1`, holding the conjecture.
    #[must_use]
    pub fn root() -> Self {
        Self(vec![1])
    }

    /// Build an id from raw components without validation.
    ///
    /// Only for test fixtures and internal construction from already-valid
    /// component paths. The public parse path is [`FromStr`].
    #[must_use]
    pub fn from_components(components: Vec<u32>) -> Self {
        debug_assert!(components.first() == Some(&1), "root component must be 1");
        debug_assert!(components.iter().all(|&c| c > 0), "components must be positive");
        Self(components)
    }

    /// The path components, root first.
    #[must_use]
    pub fn components(&self) -> &[u32] {
        &self.0
    }

    /// Number of components; the root has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Whether this is the root node `1`.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.len() == 1
    }

    /// The parent id, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// The child id obtained by appending `index` to this path.
    ///
    /// # Panics
    ///
    /// Panics if `index` is zero; child indices are 1-based.
    #[must_use]
    pub fn child(&self, index: u32) -> Self {
        assert!(index > 0, "child index is 1-based");
        let mut components = self.0.clone();
        components.push(index);
        Self(components)
    }

    /// The last path component (the child index under the parent).
    ///
    /// For the root this is `1`.
    #[must_use]
    pub fn last_index(&self) -> u32 {
        *self.0.last().unwrap_or(&1)
    }

    /// Strict ancestry test: `self` is a proper prefix of `other`.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        other.0.len() > self.0.len() && other.0[..self.0.len()] == self.0[..]
    }

    /// Whether `other` is a direct child of `self`.
    #[must_use]
    pub fn is_parent_of(&self, other: &Self) -> bool {
        other.0.len() == self.0.len() + 1 && other.0[..self.0.len()] == self.0[..]
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for component in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{component}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for NodeId {
    type Err = ParseNodeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let reject = |reason| ParseNodeIdError {
            raw: s.to_string(),
            reason,
        };

        if s.is_empty() {
            return Err(reject("empty string"));
        }
        if s.chars().any(char::is_whitespace) {
            return Err(reject("contains whitespace"));
        }

        let mut components = Vec::new();
        for segment in s.split('.') {
            if segment.is_empty() {
                // Covers leading dot, trailing dot, and consecutive dots.
                return Err(reject("empty path component"));
            }
            if segment.starts_with('+') || segment.starts_with('-') {
                return Err(reject("component is not a positive integer"));
            }
            let value: u32 = segment
                .parse()
                .map_err(|_| reject("component is not a positive integer"))?;
            if value == 0 {
                return Err(reject("zero is not a valid component"));
            }
            components.push(value);
        }

        if components[0] != 1 {
            return Err(reject("root component must be 1"));
        }

        Ok(Self(components))
    }
}

// Serde: the wire form is the dot-separated string.
impl Serialize for NodeId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> NodeId {
        s.parse().expect("valid id")
    }

    #[test]
    fn parse_accepts_valid_paths() {
        for raw in ["1", "1.1", "1.2", "1.1.1.1", "1.10.3"] {
            let parsed = id(raw);
            assert_eq!(parsed.to_string(), raw);
        }
    }

    #[test]
    fn parse_rejects_malformed_input() {
        let rejected = [
            "",        // empty
            " ",       // whitespace only
            "1. 2",    // embedded whitespace
            "1.2 ",    // trailing whitespace
            "a",       // non-numeric
            "1.x",     // non-numeric component
            "-1",      // negative
            "1.-2",    // negative component
            "1.+2",    // explicit sign
            "0",       // zero root
            "1.0",     // zero component
            ".1",      // leading dot
            "1.",      // trailing dot
            "1..2",    // consecutive dots
            "2",       // root not 1
            "2.1",     // root not 1
        ];
        for raw in rejected {
            assert!(raw.parse::<NodeId>().is_err(), "should reject '{raw}'");
        }
    }

    #[test]
    fn parse_render_roundtrip() {
        for raw in ["1", "1.1", "1.42.7", "1.1.1.1.1"] {
            assert_eq!(id(raw).to_string(), raw);
        }
    }

    #[test]
    fn parent_of_root_is_none() {
        assert_eq!(NodeId::root().parent(), None);
    }

    #[test]
    fn parent_strips_last_component() {
        assert_eq!(id("1.2.3").parent(), Some(id("1.2")));
        assert_eq!(id("1.2").parent(), Some(NodeId::root()));
    }

    #[test]
    fn child_appends_component() {
        assert_eq!(NodeId::root().child(2), id("1.2"));
        assert_eq!(id("1.2").child(1), id("1.2.1"));
    }

    #[test]
    #[should_panic(expected = "1-based")]
    fn child_index_zero_panics() {
        let _ = NodeId::root().child(0);
    }

    #[test]
    fn ancestry_is_strict_prefix() {
        let root = NodeId::root();
        assert!(root.is_ancestor_of(&id("1.1")));
        assert!(root.is_ancestor_of(&id("1.1.1")));
        assert!(id("1.1").is_ancestor_of(&id("1.1.2")));
        // Not reflexive.
        assert!(!root.is_ancestor_of(&root));
        // Siblings are unrelated.
        assert!(!id("1.1").is_ancestor_of(&id("1.2")));
        // Component-wise, not string-wise: 1.1 is not an ancestor of 1.10.
        assert!(!id("1.1").is_ancestor_of(&id("1.10")));
    }

    #[test]
    fn parent_of_is_exactly_one_level() {
        assert!(NodeId::root().is_parent_of(&id("1.3")));
        assert!(!NodeId::root().is_parent_of(&id("1.3.1")));
        assert!(!id("1.3").is_parent_of(&id("1.4")));
    }

    #[test]
    fn ordering_is_path_lexicographic() {
        let mut ids = vec![id("1.10"), id("1.2"), id("1"), id("1.2.1")];
        ids.sort();
        let rendered: Vec<String> = ids.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["1", "1.2", "1.2.1", "1.10"]);
    }

    #[test]
    fn serde_roundtrip_as_string() {
        let original = id("1.2.3");
        let json = serde_json::to_string(&original).expect("serialize");
        assert_eq!(json, "\"1.2.3\"");
        let back: NodeId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, original);
    }

    #[test]
    fn serde_rejects_invalid_string() {
        assert!(serde_json::from_str::<NodeId>("\"2.1\"").is_err());
    }

    #[test]
    fn depth_and_last_index() {
        assert_eq!(NodeId::root().depth(), 1);
        assert_eq!(id("1.4.2").depth(), 3);
        assert_eq!(id("1.4.2").last_index(), 2);
    }
}
