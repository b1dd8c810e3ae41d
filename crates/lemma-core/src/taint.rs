//! Taint analysis: propagate epistemic uncertainty through the tree.
//!
//! One topological sweep, parents before children. Node-id order already is
//! such an order (a parent path sorts before every descendant path), so the
//! walk is a single pass over the projection's sorted node map, carrying an
//! admitted-lineage flag per node. Recomputation is idempotent and any
//! persisted taint is advisory — the labels derive from epistemic states
//! and tree shape alone.

use crate::model::node::{EpistemicState, TaintState};
use crate::model::node_id::NodeId;
use crate::projection::State;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// One node whose computed taint differs from the persisted label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaintDiff {
    pub node_id: NodeId,
    pub old: TaintState,
    pub new: TaintState,
}

/// Summary of one analyzer pass.
#[derive(Debug, Clone, Serialize)]
pub struct TaintReport {
    /// Nodes examined.
    pub total: usize,
    /// Labels that changed, in node-id order.
    pub diffs: Vec<TaintDiff>,
}

impl TaintReport {
    /// Number of changed labels.
    #[must_use]
    pub fn changed(&self) -> usize {
        self.diffs.len()
    }
}

/// Compute the taint label of every node from scratch.
///
/// The rules, in order of dominance:
///
/// 1. `pending` and `needs_refinement` nodes are `unresolved` regardless of
///    ancestors.
/// 2. `refuted` and `archived` nodes are `clean` (settled, no longer
///    propagating uncertainty).
/// 3. An `admitted` node is `self_admitted`.
/// 4. A `validated` node is `tainted` when any ancestor is `self_admitted`
///    or `tainted`, otherwise `clean`.
#[must_use]
pub fn analyze(state: &State) -> BTreeMap<NodeId, TaintState> {
    // lineage[n] = some strict ancestor of n is admitted. An ancestor label
    // in {self_admitted, tainted} reduces to exactly this condition, because
    // tainted itself only arises under an admitted ancestor.
    let mut lineage: HashMap<NodeId, bool> = HashMap::new();
    let mut labels = BTreeMap::new();

    for node in state.nodes() {
        let tainted_lineage = node.id.parent().is_some_and(|parent| {
            let parent_lineage = lineage.get(&parent).copied().unwrap_or(false);
            let parent_admitted = state
                .node(&parent)
                .is_some_and(|p| p.epistemic == EpistemicState::Admitted);
            parent_lineage || parent_admitted
        });
        lineage.insert(node.id.clone(), tainted_lineage);

        let label = match node.epistemic {
            EpistemicState::Pending | EpistemicState::NeedsRefinement => TaintState::Unresolved,
            EpistemicState::Refuted | EpistemicState::Archived => TaintState::Clean,
            EpistemicState::Admitted => TaintState::SelfAdmitted,
            EpistemicState::Validated => {
                if tainted_lineage {
                    TaintState::Tainted
                } else {
                    TaintState::Clean
                }
            }
        };
        labels.insert(node.id.clone(), label);
    }

    labels
}

/// Compute labels and report which differ from the persisted values.
#[must_use]
pub fn recompute(state: &State) -> TaintReport {
    let labels = analyze(state);
    let diffs: Vec<TaintDiff> = state
        .nodes()
        .filter_map(|node| {
            let new = labels.get(&node.id).copied()?;
            (new != node.taint).then(|| TaintDiff {
                node_id: node.id.clone(),
                old: node.taint,
                new,
            })
        })
        .collect();

    debug!(total = state.node_count(), changed = diffs.len(), "taint pass");
    TaintReport {
        total: state.node_count(),
        diffs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Event, EventPayload};
    use crate::model::node::{Inference, NodeKind};
    use chrono::Utc;

    fn nid(s: &str) -> NodeId {
        s.parse().expect("valid id")
    }

    fn build_state(shape: &[(&str, EpistemicState)]) -> State {
        let mut events = vec![Event {
            seq: 1,
            timestamp: Utc::now(),
            payload: EventPayload::ProofInitialized {
                conjecture: "C".into(),
                author: "a".into(),
                created_at: Utc::now(),
            },
        }];
        let mut seq = 1;
        for (id, _) in shape.iter().filter(|(id, _)| *id != "1") {
            seq += 1;
            let node_id = nid(id);
            let parent = node_id.parent().expect("non-root");
            events.push(Event {
                seq,
                timestamp: Utc::now(),
                payload: EventPayload::NodeCreated {
                    node_id,
                    kind: NodeKind::Claim,
                    statement: (*id).to_string(),
                    inference: Inference::Assumption,
                    parent,
                },
            });
        }
        for (id, epistemic) in shape {
            let payload = match epistemic {
                EpistemicState::Pending => continue,
                EpistemicState::Validated => EventPayload::NodeValidated { node_id: nid(id) },
                EpistemicState::Admitted => EventPayload::NodeAdmitted { node_id: nid(id) },
                EpistemicState::Refuted => EventPayload::NodeRefuted {
                    node_id: nid(id),
                    reason: None,
                },
                EpistemicState::Archived => EventPayload::NodeArchived { node_id: nid(id) },
                EpistemicState::NeedsRefinement => EventPayload::NodeRefinementRequested {
                    node_id: nid(id),
                    reason: "r".into(),
                    agent: "a".into(),
                },
            };
            seq += 1;
            events.push(Event {
                seq,
                timestamp: Utc::now(),
                payload,
            });
        }
        State::replay_events(&events).expect("replay")
    }

    #[test]
    fn admit_propagates_to_validated_descendants() {
        // The S1 shape: admit 1.1, validate everything else.
        let state = build_state(&[
            ("1", EpistemicState::Validated),
            ("1.1", EpistemicState::Admitted),
            ("1.2", EpistemicState::Validated),
            ("1.1.1", EpistemicState::Validated),
        ]);
        let labels = analyze(&state);
        assert_eq!(labels[&nid("1")], TaintState::Clean);
        assert_eq!(labels[&nid("1.1")], TaintState::SelfAdmitted);
        assert_eq!(labels[&nid("1.2")], TaintState::Clean);
        assert_eq!(labels[&nid("1.1.1")], TaintState::Tainted);
    }

    #[test]
    fn pending_dominates_ancestry() {
        let state = build_state(&[
            ("1", EpistemicState::Admitted),
            ("1.1", EpistemicState::Pending),
            ("1.1.1", EpistemicState::Validated),
        ]);
        let labels = analyze(&state);
        // Pending stays unresolved even under an admitted ancestor...
        assert_eq!(labels[&nid("1.1")], TaintState::Unresolved);
        // ...but the admitted grandparent still taints the validated leaf.
        assert_eq!(labels[&nid("1.1.1")], TaintState::Tainted);
    }

    #[test]
    fn refuted_and_archived_are_clean() {
        let state = build_state(&[
            ("1", EpistemicState::Admitted),
            ("1.1", EpistemicState::Refuted),
            ("1.2", EpistemicState::Archived),
        ]);
        let labels = analyze(&state);
        assert_eq!(labels[&nid("1.1")], TaintState::Clean);
        assert_eq!(labels[&nid("1.2")], TaintState::Clean);
    }

    #[test]
    fn needs_refinement_is_unresolved() {
        let state = build_state(&[
            ("1", EpistemicState::Validated),
            ("1.1", EpistemicState::NeedsRefinement),
        ]);
        assert_eq!(analyze(&state)[&nid("1.1")], TaintState::Unresolved);
    }

    #[test]
    fn siblings_do_not_affect_each_other() {
        let state = build_state(&[
            ("1", EpistemicState::Validated),
            ("1.1", EpistemicState::Admitted),
            ("1.2", EpistemicState::Validated),
            ("1.3", EpistemicState::Validated),
        ]);
        let labels = analyze(&state);
        assert_eq!(labels[&nid("1.2")], TaintState::Clean);
        assert_eq!(labels[&nid("1.3")], TaintState::Clean);
    }

    #[test]
    fn taint_reaches_deep_descendants() {
        let state = build_state(&[
            ("1", EpistemicState::Validated),
            ("1.1", EpistemicState::Admitted),
            ("1.1.1", EpistemicState::Validated),
            ("1.1.1.1", EpistemicState::Validated),
        ]);
        let labels = analyze(&state);
        assert_eq!(labels[&nid("1.1.1")], TaintState::Tainted);
        assert_eq!(labels[&nid("1.1.1.1")], TaintState::Tainted);
    }

    #[test]
    fn change_is_local_to_the_subtree() {
        // Two independent subtrees under the root; admitting inside 1.1
        // must leave every label in the 1.2 subtree untouched.
        let before = build_state(&[
            ("1", EpistemicState::Validated),
            ("1.1", EpistemicState::Validated),
            ("1.1.1", EpistemicState::Validated),
            ("1.2", EpistemicState::Validated),
            ("1.2.1", EpistemicState::Validated),
        ]);
        let after = build_state(&[
            ("1", EpistemicState::Validated),
            ("1.1", EpistemicState::Admitted),
            ("1.1.1", EpistemicState::Validated),
            ("1.2", EpistemicState::Validated),
            ("1.2.1", EpistemicState::Validated),
        ]);

        let labels_before = analyze(&before);
        let labels_after = analyze(&after);
        for id in ["1", "1.2", "1.2.1"] {
            assert_eq!(
                labels_before[&nid(id)],
                labels_after[&nid(id)],
                "label of {id} changed outside the touched subtree"
            );
        }
    }

    #[test]
    fn recompute_is_idempotent() {
        let state = build_state(&[
            ("1", EpistemicState::Validated),
            ("1.1", EpistemicState::Admitted),
            ("1.1.1", EpistemicState::Validated),
        ]);
        let first = analyze(&state);
        let second = analyze(&state);
        assert_eq!(first, second);
    }

    #[test]
    fn recompute_reports_diffs_against_persisted() {
        // Freshly-created nodes persist as unresolved; validating them makes
        // the analyzer report clean diffs until taint_recomputed events land.
        let state = build_state(&[
            ("1", EpistemicState::Validated),
            ("1.1", EpistemicState::Pending),
        ]);
        let report = recompute(&state);
        assert_eq!(report.total, 2);
        assert_eq!(report.changed(), 1);
        assert_eq!(report.diffs[0].node_id, nid("1"));
        assert_eq!(report.diffs[0].old, TaintState::Unresolved);
        assert_eq!(report.diffs[0].new, TaintState::Clean);
    }
}
