//! Sister-clade scoring and the phylogenetic signal (D) statistic.
//!
//! Measures how clustered a binary trait is on a dendrogram:
//!
//! - [`clade_signals`] — per-node continuous clade signal in `[0, 1]`
//! - [`signal_statistic`] — aggregate dissimilarity over internal nodes
//! - [`d_statistic`] — the two composed, for one presence set
//!
//! Smaller statistics indicate a trait concentrated on few clades; larger
//! ones indicate scattered occurrence. The null-distribution generators in
//! [`crate::null_model`] compare an observed statistic against permuted and
//! Brownian-motion references built from these same functions.

use dendra_core::{DendraError, Result};

use crate::tree::{DendroNode, DendroTree, PresenceSet};

/// Per-node clade signal, index-aligned.
///
/// A leaf scores `1.0` if its label is in the presence set, else `0.0`.
/// An internal node averages its children's contributions, each child
/// contributing `childSignal / (height − childHeight)`; a zero branch gap
/// contributes exactly `0.0` rather than dividing by zero.
pub fn clade_signals(tree: &DendroTree, presence: &PresenceSet) -> Vec<f64> {
    let mut signals = vec![0.0; tree.node_count()];
    signals_walk(tree.root(), presence, &mut signals);
    signals
}

fn signals_walk(node: &DendroNode, presence: &PresenceSet, signals: &mut [f64]) {
    if node.is_leaf() {
        signals[node.index] = if presence.contains(node.label) { 1.0 } else { 0.0 };
        return;
    }

    let h = node.height;

    let mut lscore = 0.0;
    if let Some(left) = node.left.as_deref() {
        signals_walk(left, presence, signals);
        let gap = h - left.height;
        lscore = if gap == 0.0 { 0.0 } else { signals[left.index] / gap };
    }

    let mut rscore = 0.0;
    if let Some(right) = node.right.as_deref() {
        signals_walk(right, presence, signals);
        let gap = h - right.height;
        rscore = if gap == 0.0 { 0.0 } else { signals[right.index] / gap };
    }

    signals[node.index] = (lscore + rscore) / 2.0;
}

/// Aggregate signal dissimilarity: postorder sum over internal nodes of
/// `|node − left| + |node − right|`. A single-leaf tree scores `0.0`.
///
/// # Errors
///
/// Returns an error if `signals` is not index-aligned to the tree.
pub fn signal_statistic(tree: &DendroTree, signals: &[f64]) -> Result<f64> {
    if signals.len() != tree.node_count() {
        return Err(DendraError::InvalidInput(format!(
            "signal array length {} does not match node count {}",
            signals.len(),
            tree.node_count()
        )));
    }
    Ok(statistic_walk(tree.root(), signals))
}

fn statistic_walk(node: &DendroNode, signals: &[f64]) -> f64 {
    let (Some(left), Some(right)) = (node.left.as_deref(), node.right.as_deref()) else {
        return 0.0;
    };

    let mut total = statistic_walk(left, signals) + statistic_walk(right, signals);
    let cur = signals[node.index];
    total += (cur - signals[left.index]).abs();
    total += (cur - signals[right.index]).abs();
    total
}

/// Observed D statistic for one presence set.
///
/// # Example
///
/// ```
/// use dendra_phylo::signal::d_statistic;
/// use dendra_phylo::tree::{DendroTree, NodeSpec, PresenceSet};
///
/// let spec = NodeSpec::internal(
///     2.0,
///     NodeSpec::internal(1.0, NodeSpec::leaf("A", 0.0), NodeSpec::leaf("B", 0.0)),
///     NodeSpec::leaf("C", 0.0),
/// );
/// let tree = DendroTree::from_spec(&spec).unwrap();
/// let d = d_statistic(&tree, &PresenceSet::from_labels(&["A", "B"]));
/// assert_eq!(d, 1.0);
/// ```
pub fn d_statistic(tree: &DendroTree, presence: &PresenceSet) -> f64 {
    let signals = clade_signals(tree, presence);
    statistic_walk(tree.root(), &signals)
}
