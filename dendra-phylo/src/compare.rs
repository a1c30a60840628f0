//! Comparison of gain/loss histories on the same dendrogram.
//!
//! Scores how well one reconstructed event history is corroborated by a
//! second, independently reconstructed one:
//!
//! - [`concordance_node_scores`] — per-node signed nearest-event scores
//! - [`concordance`] — bounded aggregate similarity statistic
//! - [`jaccard`] / [`hamming`] — simple elementwise distances over
//!   index-aligned integer vectors
//!
//! The concordance search looks, for every event in the reference history,
//! for the nearest event in the candidate history: first within the node's
//! own subtree, then — for non-root nodes — across the root into the sister
//! subtree. Distances are measured between branch midpoints; the chosen
//! candidate's distance plus one becomes the score magnitude, signed by
//! whether the two events run in the same direction.

use dendra_core::{DendraError, Result};

use crate::reconstruct::GainLoss;
use crate::tree::{DendroNode, DendroTree};

/// Nearest node with a `v2` event in the subtree rooted at `node`.
///
/// Nodes below the start that carry a `v1` event are pruned together with
/// their subtrees, so only purely-candidate events are matched; the start
/// node itself may match when its own `v2` entry is an event. When both
/// children yield a candidate, the one with the smaller midpoint key
/// (`height + leftChildHeight`) wins, the right candidate taking ties.
fn find_next_event<'a>(
    node: &'a DendroNode,
    v2: &[GainLoss],
    v1: &[GainLoss],
    is_start: bool,
) -> Option<&'a DendroNode> {
    if !is_start && v1[node.index].is_event() {
        return None;
    }
    if v2[node.index].is_event() {
        return Some(node);
    }

    let left = node
        .left
        .as_deref()
        .and_then(|l| find_next_event(l, v2, v1, false));
    let right = node
        .right
        .as_deref()
        .and_then(|r| find_next_event(r, v2, v1, false));

    match (left, right) {
        (Some(l), Some(r)) => {
            let rkey = match r.left.as_deref() {
                Some(rl) => r.height + rl.height,
                None => r.height,
            };
            // A left candidate with no left child keys off the right
            // candidate's height.
            let lkey = match l.left.as_deref() {
                Some(ll) => l.height + ll.height,
                None => r.height,
            };
            if rkey <= lkey {
                Some(r)
            } else {
                Some(l)
            }
        }
        (l, r) => r.or(l),
    }
}

/// Same-side midpoint distance, with the coincident-midpoint fallback of a
/// third of the node's own branch span.
fn same_side_distance(node: &DendroNode, mp_cn: f64, mp_ss: f64) -> f64 {
    if mp_ss == mp_cn {
        let child_h = node.left.as_deref().map_or(0.0, |l| l.height);
        (node.height - child_h) / 3.0
    } else {
        (mp_cn - mp_ss).abs()
    }
}

fn score_walk(
    node: &DendroNode,
    v1: &[GainLoss],
    v2: &[GainLoss],
    root: &DendroNode,
    is_root: bool,
    scores: &mut [f64],
) {
    let v = node.index;
    scores[v] = 0.0;

    if v1[v].is_event() {
        let same_side = find_next_event(node, v2, v1, true);

        let mut other_side = None;
        if !is_root {
            if let (Some(rl), Some(rr)) = (root.left.as_deref(), root.right.as_deref()) {
                // The sister subtree across the root: postorder indexing puts
                // every node of the root's left subtree at or below the left
                // child's index.
                let start = if v <= rl.index { rr } else { rl };
                other_side = find_next_event(start, v2, v1, false);
            }
        }

        let mp_cn = node.midpoint();
        let chosen = match (same_side, other_side) {
            (Some(ss), Some(os)) => {
                let mp_ss = ss.midpoint();
                // Path up to the root and back down to the other-side match.
                let oshd = 2.0 * root.height - os.midpoint() - mp_cn;
                if oshd < mp_cn - mp_ss {
                    Some((os, oshd))
                } else {
                    Some((ss, same_side_distance(node, mp_cn, mp_ss)))
                }
            }
            (Some(ss), None) => Some((ss, same_side_distance(node, mp_cn, ss.midpoint()))),
            (None, Some(os)) => Some((os, 2.0 * root.height - os.midpoint() - mp_cn)),
            (None, None) => None,
        };

        if let Some((target, distance)) = chosen {
            let sign = if v1[v] == v2[target.index] { 1.0 } else { -1.0 };
            scores[v] = sign * (distance + 1.0);
        }
    }

    if let Some(left) = node.left.as_deref() {
        score_walk(left, v1, v2, root, false, scores);
    }
    if let Some(right) = node.right.as_deref() {
        score_walk(right, v1, v2, root, false, scores);
    }
}

/// Per-node signed concordance scores of reference history `v1` against
/// candidate history `v2`, index-aligned. Nodes without a `v1` event score
/// `0.0`.
///
/// # Errors
///
/// Returns an error if either history is not index-aligned to the tree.
pub fn concordance_node_scores(
    tree: &DendroTree,
    v1: &[GainLoss],
    v2: &[GainLoss],
) -> Result<Vec<f64>> {
    let n = tree.node_count();
    if v1.len() != n || v2.len() != n {
        return Err(DendraError::InvalidInput(format!(
            "history lengths {} / {} do not match node count {}",
            v1.len(),
            v2.len(),
            n
        )));
    }
    let mut scores = vec![0.0; n];
    score_walk(tree.root(), v1, v2, tree.root(), true, &mut scores);
    Ok(scores)
}

/// Aggregate concordance similarity between two gain/loss histories.
///
/// Each nonzero per-node score `s` contributes `±8 / (8·exp(|s| − 1))`,
/// evaluated as `±exp(1 − |s|)`; zero scores contribute nothing. Larger
/// values indicate stronger directional and positional agreement.
///
/// # Errors
///
/// Returns an error if either history is not index-aligned to the tree.
pub fn concordance(tree: &DendroTree, v1: &[GainLoss], v2: &[GainLoss]) -> Result<f64> {
    let scores = concordance_node_scores(tree, v1, v2)?;
    let mut total = 0.0;
    for &s in &scores {
        if s != 0.0 {
            total += s.signum() * (1.0 - s.abs()).exp();
        }
    }
    Ok(total)
}

/// Jaccard-style agreement score between two index-aligned integer vectors:
/// agreement count normalized by `2·N − agreementCount`. Symmetric in its
/// inputs.
///
/// # Errors
///
/// Returns an error if the vectors differ in length or are empty.
pub fn jaccard(v1: &[i8], v2: &[i8]) -> Result<f64> {
    check_vectors(v1, v2)?;
    let agree = v1.iter().zip(v2).filter(|(a, b)| a == b).count() as f64;
    Ok(agree / (2.0 * v1.len() as f64 - agree))
}

/// Hamming-style similarity between two index-aligned integer vectors:
/// one minus the mean normalized absolute difference. Identical vectors
/// score exactly `1.0`.
///
/// # Errors
///
/// Returns an error if the vectors differ in length, are empty, or
/// `normalizer` is zero.
pub fn hamming(v1: &[i8], v2: &[i8], normalizer: f64) -> Result<f64> {
    check_vectors(v1, v2)?;
    if normalizer == 0.0 {
        return Err(DendraError::InvalidInput("normalizer must be nonzero".into()));
    }
    let total: f64 = v1
        .iter()
        .zip(v2)
        .map(|(&a, &b)| (f64::from(a) - f64::from(b)).abs() / normalizer)
        .sum();
    Ok(1.0 - total / v1.len() as f64)
}

fn check_vectors(v1: &[i8], v2: &[i8]) -> Result<()> {
    if v1.len() != v2.len() {
        return Err(DendraError::InvalidInput(format!(
            "vector lengths differ: {} vs {}",
            v1.len(),
            v2.len()
        )));
    }
    if v1.is_empty() {
        return Err(DendraError::InvalidInput("vectors must be non-empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeSpec;

    const EPS: f64 = 1e-12;

    /// (((A,B)@1, (C,D)@2)@3, (E,F)@1.5)@4
    ///
    /// Postorder: A=0 B=1 AB=2 C=3 D=4 CD=5 ABCD=6 E=7 F=8 EF=9 root=10.
    fn six_leaf_tree() -> DendroTree {
        let spec = NodeSpec::internal(
            4.0,
            NodeSpec::internal(
                3.0,
                NodeSpec::internal(1.0, NodeSpec::leaf("A", 0.0), NodeSpec::leaf("B", 0.0)),
                NodeSpec::internal(2.0, NodeSpec::leaf("C", 0.0), NodeSpec::leaf("D", 0.0)),
            ),
            NodeSpec::internal(1.5, NodeSpec::leaf("E", 0.0), NodeSpec::leaf("F", 0.0)),
        );
        DendroTree::from_spec(&spec).unwrap()
    }

    fn history(n: usize, events: &[(usize, GainLoss)]) -> Vec<GainLoss> {
        let mut v = vec![GainLoss::NoChange; n];
        for &(i, e) in events {
            v[i] = e;
        }
        v
    }

    #[test]
    fn no_events_scores_zero() {
        let tree = six_leaf_tree();
        let empty = history(tree.node_count(), &[]);
        let scores = concordance_node_scores(&tree, &empty, &empty).unwrap();
        assert!(scores.iter().all(|&s| s == 0.0));
        assert_eq!(concordance(&tree, &empty, &empty).unwrap(), 0.0);
    }

    #[test]
    fn self_match_uses_midpoint_fallback() {
        // An event matching itself has coincident midpoints, so the distance
        // falls back to a third of the node's branch span.
        let tree = six_leaf_tree();
        let v = history(tree.node_count(), &[(2, GainLoss::Gain)]);
        let scores = concordance_node_scores(&tree, &v, &v).unwrap();
        // AB spans height 1.0 to 0.0 → fallback 1/3, magnitude 1 + 1/3.
        assert!((scores[2] - 4.0 / 3.0).abs() < EPS);
        let agg = concordance(&tree, &v, &v).unwrap();
        assert!((agg - (-1.0_f64 / 3.0).exp()).abs() < EPS);
    }

    #[test]
    fn same_side_candidate_in_subtree() {
        let tree = six_leaf_tree();
        let v1 = history(tree.node_count(), &[(6, GainLoss::Gain)]);
        let v2 = history(tree.node_count(), &[(5, GainLoss::Gain)]);
        let scores = concordance_node_scores(&tree, &v1, &v2).unwrap();
        // ABCD midpoint (3+1)/2 = 2, CD midpoint (2+0)/2 = 1 → distance 1,
        // score +2.
        assert!((scores[6] - 2.0).abs() < EPS);
        let agg = concordance(&tree, &v1, &v2).unwrap();
        assert!((agg - (-1.0_f64).exp()).abs() < EPS);
    }

    #[test]
    fn opposite_direction_scores_negative() {
        let tree = six_leaf_tree();
        let v1 = history(tree.node_count(), &[(6, GainLoss::Gain)]);
        let v2 = history(tree.node_count(), &[(5, GainLoss::Loss)]);
        let scores = concordance_node_scores(&tree, &v1, &v2).unwrap();
        assert!((scores[6] + 2.0).abs() < EPS);
        let agg = concordance(&tree, &v1, &v2).unwrap();
        assert!(agg < 0.0);
    }

    #[test]
    fn other_side_candidate_across_root() {
        // No candidate below AB; the only v2 event sits in the sister
        // subtree across the root.
        let tree = six_leaf_tree();
        let v1 = history(tree.node_count(), &[(2, GainLoss::Gain)]);
        let v2 = history(tree.node_count(), &[(9, GainLoss::Gain)]);
        let scores = concordance_node_scores(&tree, &v1, &v2).unwrap();
        // AB midpoint 0.5, EF midpoint 0.75, path 2·4 − 0.75 − 0.5 = 6.75,
        // score +7.75.
        assert!((scores[2] - 7.75).abs() < EPS);
    }

    #[test]
    fn same_side_preferred_when_closer() {
        let tree = six_leaf_tree();
        let v1 = history(tree.node_count(), &[(6, GainLoss::Gain)]);
        let v2 = history(
            tree.node_count(),
            &[(5, GainLoss::Gain), (9, GainLoss::Gain)],
        );
        let scores = concordance_node_scores(&tree, &v1, &v2).unwrap();
        // Same-side distance 1.0 beats the 5.25 other-side path.
        assert!((scores[6] - 2.0).abs() < EPS);
    }

    #[test]
    fn root_has_no_sister_subtree() {
        let tree = six_leaf_tree();
        let v1 = history(tree.node_count(), &[(10, GainLoss::Gain)]);
        let v2 = history(tree.node_count(), &[]);
        let scores = concordance_node_scores(&tree, &v1, &v2).unwrap();
        assert_eq!(scores[10], 0.0);
    }

    #[test]
    fn v1_events_prune_candidate_search() {
        // The candidate below ABCD is shadowed by a v1 event on the path.
        let tree = six_leaf_tree();
        let v1 = history(
            tree.node_count(),
            &[(6, GainLoss::Gain), (5, GainLoss::Gain)],
        );
        let v2 = history(tree.node_count(), &[(3, GainLoss::Gain)]);
        let scores = concordance_node_scores(&tree, &v1, &v2).unwrap();
        // Search from ABCD cannot pass through CD (a v1 event), and the
        // sister subtree is empty of v2 events.
        assert_eq!(scores[6], 0.0);
        // CD itself still matches the leaf candidate below it.
        assert!(scores[5] > 0.0);
    }

    #[test]
    fn self_comparison_bounds_permuted_comparison() {
        // Monotonicity: comparing a history against itself scores at least
        // as high as against any displaced copy of the same events.
        let tree = six_leaf_tree();
        let v = history(tree.node_count(), &[(2, GainLoss::Gain)]);
        let self_score = concordance(&tree, &v, &v).unwrap();
        for shifted in [
            history(tree.node_count(), &[(9, GainLoss::Gain)]),
            history(tree.node_count(), &[(5, GainLoss::Gain)]),
            history(tree.node_count(), &[(10, GainLoss::Gain)]),
        ] {
            let displaced = concordance(&tree, &v, &shifted).unwrap();
            assert!(
                self_score >= displaced,
                "self {} < displaced {}",
                self_score,
                displaced
            );
        }
    }

    #[test]
    fn mismatched_lengths_rejected() {
        let tree = six_leaf_tree();
        let short = history(3, &[]);
        let ok = history(tree.node_count(), &[]);
        assert!(concordance(&tree, &short, &ok).is_err());
        assert!(concordance_node_scores(&tree, &ok, &short).is_err());
    }

    #[test]
    fn jaccard_symmetry() {
        let v1 = [1i8, 0, -1, 0, 1];
        let v2 = [1i8, 1, -1, 0, 0];
        assert_eq!(jaccard(&v1, &v2).unwrap(), jaccard(&v2, &v1).unwrap());
    }

    #[test]
    fn jaccard_identical_vectors() {
        let v = [1i8, 0, -1, 1];
        // agreement = N → N / (2N − N) = 1.
        assert_eq!(jaccard(&v, &v).unwrap(), 1.0);
    }

    #[test]
    fn jaccard_no_agreement() {
        let v1 = [1i8, 1];
        let v2 = [0i8, 0];
        // 0 / (2·2 − 0) = 0.
        assert_eq!(jaccard(&v1, &v2).unwrap(), 0.0);
    }

    #[test]
    fn hamming_identity() {
        let v = [1i8, 0, -1, 1, 0];
        assert_eq!(hamming(&v, &v, 1.0).unwrap(), 1.0);
        assert_eq!(hamming(&v, &v, 2.5).unwrap(), 1.0);
    }

    #[test]
    fn hamming_hand_computed() {
        let v1 = [1i8, 0];
        let v2 = [0i8, 0];
        // mean(|1−0|/1, 0) = 0.5 → score 0.5
        assert_eq!(hamming(&v1, &v2, 1.0).unwrap(), 0.5);
    }

    #[test]
    fn hamming_zero_normalizer_rejected() {
        let v = [1i8];
        assert!(hamming(&v, &v, 0.0).is_err());
    }

    #[test]
    fn empty_vectors_rejected() {
        assert!(jaccard(&[], &[]).is_err());
        assert!(hamming(&[], &[], 1.0).is_err());
    }
}
