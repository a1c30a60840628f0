//! Ancestral trait reconstruction via Fitch parsimony.
//!
//! Infers presence/absence of a binary trait at the internal nodes of a
//! dendrogram from the observed leaf states, then converts the
//! reconstruction into a per-node gain/loss event history:
//!
//! - [`fitch_up`] — postorder pass propagating child states upward
//! - [`fitch_down`] — preorder pass resolving ambiguity by majority vote
//! - [`fitch_reconcile`] — forces any remaining ambiguity to a default
//! - [`extract_events`] — converts final states to gain/loss transitions
//!
//! The three-phase pipeline is total: it succeeds for any tree and any
//! presence set, including the empty and full sets, and after
//! reconciliation no node remains [`TriState::Ambiguous`].

use dendra_core::{DendraError, Result};

use crate::tree::{DendroNode, DendroTree, PresenceSet};

/// Trait state at a node during and after reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TriState {
    /// Trait absent.
    Absent,
    /// Trait present.
    Present,
    /// Undetermined (only observable between phases).
    Ambiguous,
}

impl TriState {
    fn slot(self) -> usize {
        match self {
            TriState::Absent => 0,
            TriState::Present => 1,
            TriState::Ambiguous => 2,
        }
    }
}

/// Gain/loss transition at a node, relative to its parent's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GainLoss {
    /// Same state as the parent.
    NoChange,
    /// Absent → present transition on the branch above this node.
    Gain,
    /// Present → absent transition on the branch above this node.
    Loss,
}

impl GainLoss {
    /// True for `Gain` or `Loss`.
    pub fn is_event(self) -> bool {
        self != GainLoss::NoChange
    }

    /// Integer encoding for index-aligned marshaling: 0 / 1 / −1.
    pub fn as_i8(self) -> i8 {
        match self {
            GainLoss::NoChange => 0,
            GainLoss::Gain => 1,
            GainLoss::Loss => -1,
        }
    }
}

/// Result of a full reconstruction: final tri-states, index-aligned.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AncestralStates {
    /// Reconstructed state for each node (offset = postorder index).
    pub states: Vec<TriState>,
}

/// Up phase (postorder): a leaf is `Present` iff its label is in the
/// presence set; an internal node takes the shared child state, propagates
/// through an `Ambiguous` child, or becomes `Ambiguous` on disagreement.
pub fn fitch_up(node: &DendroNode, presence: &PresenceSet, states: &mut [TriState]) {
    if node.is_leaf() {
        states[node.index] = if presence.contains(node.label) {
            TriState::Present
        } else {
            TriState::Absent
        };
        return;
    }

    let mut lv = TriState::Ambiguous;
    if let Some(left) = node.left.as_deref() {
        fitch_up(left, presence, states);
        lv = states[left.index];
    }

    let mut rv = TriState::Ambiguous;
    if let Some(right) = node.right.as_deref() {
        fitch_up(right, presence, states);
        rv = states[right.index];
    }

    states[node.index] = if lv == TriState::Ambiguous || rv == TriState::Ambiguous {
        if rv == TriState::Ambiguous {
            lv
        } else {
            rv
        }
    } else if lv == rv {
        lv
    } else {
        TriState::Ambiguous
    };
}

/// Down phase (preorder): resolves nodes left `Ambiguous` by the up phase
/// with a majority vote over the parent's resolved state and the two
/// up-phase child states (a missing child slot votes `Ambiguous`). The vote
/// resolves only on a strict Present/Absent majority; the caller seeds the
/// root's parent slot with `parent_state`.
pub fn fitch_down(node: &DendroNode, parent_state: TriState, states: &mut [TriState]) {
    if node.is_leaf() {
        return;
    }

    if states[node.index] == TriState::Ambiguous {
        let mut counts = [0usize; 3];
        counts[parent_state.slot()] += 1;
        let lv = node
            .left
            .as_deref()
            .map_or(TriState::Ambiguous, |l| states[l.index]);
        let rv = node
            .right
            .as_deref()
            .map_or(TriState::Ambiguous, |r| states[r.index]);
        counts[lv.slot()] += 1;
        counts[rv.slot()] += 1;

        if counts[2] != 3 && counts[0] != counts[1] {
            states[node.index] = if counts[1] > counts[0] {
                TriState::Present
            } else {
                TriState::Absent
            };
        }
    }

    let resolved = states[node.index];
    if let Some(left) = node.left.as_deref() {
        fitch_down(left, resolved, states);
    }
    if let Some(right) = node.right.as_deref() {
        fitch_down(right, resolved, states);
    }
}

/// Reconciliation: force any node still `Ambiguous` to `default_state`.
pub fn fitch_reconcile(states: &mut [TriState], default_state: TriState) {
    for s in states.iter_mut() {
        if *s == TriState::Ambiguous {
            *s = default_state;
        }
    }
}

/// Convert a fully resolved tri-state array into a gain/loss history.
///
/// Walks preorder carrying the accumulated ancestral presence downward,
/// starting from the root's own state (so the root itself is always
/// `NoChange`); a flip to present is a `Gain`, a flip to absent a `Loss`.
pub fn extract_events(tree: &DendroTree, states: &[TriState]) -> Vec<GainLoss> {
    fn walk(node: &DendroNode, ancestral: bool, states: &[TriState], events: &mut [GainLoss]) {
        let here = states[node.index] == TriState::Present;
        let carried = if here != ancestral {
            events[node.index] = if ancestral {
                GainLoss::Loss
            } else {
                GainLoss::Gain
            };
            here
        } else {
            events[node.index] = GainLoss::NoChange;
            ancestral
        };
        if let Some(left) = node.left.as_deref() {
            walk(left, carried, states, events);
        }
        if let Some(right) = node.right.as_deref() {
            walk(right, carried, states, events);
        }
    }

    let mut events = vec![GainLoss::NoChange; tree.node_count()];
    let root_present = states[tree.root().index] == TriState::Present;
    walk(tree.root(), root_present, states, &mut events);
    events
}

/// Full three-phase reconstruction for one presence set.
///
/// `root_default` seeds the down-phase vote at the root and fills any node
/// the vote could not resolve; it must not be `Ambiguous`.
///
/// # Errors
///
/// Returns an error if `root_default` is `Ambiguous`.
///
/// # Example
///
/// ```
/// use dendra_phylo::reconstruct::{reconstruct, TriState};
/// use dendra_phylo::tree::{DendroTree, NodeSpec, PresenceSet};
///
/// let spec = NodeSpec::internal(
///     2.0,
///     NodeSpec::internal(1.0, NodeSpec::leaf("A", 0.0), NodeSpec::leaf("B", 0.0)),
///     NodeSpec::leaf("C", 0.0),
/// );
/// let tree = DendroTree::from_spec(&spec).unwrap();
/// let presence = PresenceSet::from_labels(&["A", "B"]);
/// let result = reconstruct(&tree, &presence, TriState::Absent).unwrap();
/// assert!(result.states.iter().all(|&s| s != TriState::Ambiguous));
/// ```
pub fn reconstruct(
    tree: &DendroTree,
    presence: &PresenceSet,
    root_default: TriState,
) -> Result<AncestralStates> {
    if root_default == TriState::Ambiguous {
        return Err(DendraError::InvalidInput(
            "root default state must be Present or Absent".into(),
        ));
    }

    let mut states = vec![TriState::Ambiguous; tree.node_count()];
    fitch_up(tree.root(), presence, &mut states);
    fitch_down(tree.root(), root_default, &mut states);
    fitch_reconcile(&mut states, root_default);
    Ok(AncestralStates { states })
}

/// Reconstruct and convert to a gain/loss event history in one call.
///
/// # Errors
///
/// Returns an error if `root_default` is `Ambiguous`.
pub fn gain_loss(
    tree: &DendroTree,
    presence: &PresenceSet,
    root_default: TriState,
) -> Result<Vec<GainLoss>> {
    let result = reconstruct(tree, presence, root_default)?;
    Ok(extract_events(tree, &result.states))
}
