//! Core dendrogram data structures.
//!
//! A [`DendroTree`] is a rooted, strictly binary tree in which every node
//! exclusively owns its children. Nodes carry a branch-length-like `height`,
//! a subtree leaf count (`members`), and — for leaves — a hashed taxon label.
//!
//! During construction every node is assigned a postorder `index` in
//! `[0, node_count)`: both children are fully indexed before their parent,
//! so the root always receives the maximum index and `index` can be used
//! directly as an offset into any per-node array.

use std::collections::HashSet;

use dendra_core::{hash_label, DendraError, Result, Summarizable};

/// A single node in a dendrogram.
///
/// Either both children are present (internal node) or both are absent
/// (leaf). Leaves carry a hashed taxon label; internal nodes do not.
#[derive(Debug, Clone)]
pub struct DendroNode {
    /// Branch-length-like depth measure; non-negative.
    pub height: f64,
    /// Postorder index of this node, usable as a dense array offset.
    pub index: usize,
    /// Number of leaves in the subtree rooted here.
    pub members: u32,
    /// Hashed taxon label (`None` for internal nodes).
    pub label: Option<u32>,
    /// Left child, exclusively owned.
    pub left: Option<Box<DendroNode>>,
    /// Right child, exclusively owned.
    pub right: Option<Box<DendroNode>>,
}

impl DendroNode {
    /// True if this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// Branch midpoint used by the concordance search: halfway between this
    /// node's height and its left child's height (a leaf uses height 0 for
    /// the missing child).
    pub(crate) fn midpoint(&self) -> f64 {
        let child_h = self.left.as_deref().map_or(0.0, |l| l.height);
        (self.height + child_h) / 2.0
    }
}

/// Generic nested node representation accepted by [`DendroTree::from_spec`].
///
/// Mirrors the attribute set of host dendrogram objects: every attribute is
/// optional and defaults are applied during conversion (`height` 0.0,
/// `members` 1, no label). A node marked `leaf` must have no children;
/// every other node must have exactly two.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeSpec {
    /// Branch-length-like depth measure.
    pub height: Option<f64>,
    /// Leaf count of the subtree.
    pub members: Option<u32>,
    /// Taxon label (hashed during conversion).
    pub label: Option<String>,
    /// Marks this node as a leaf.
    #[cfg_attr(feature = "serde", serde(default))]
    pub leaf: bool,
    /// Child nodes, in left/right order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    /// Convenience constructor for a leaf with a label and height.
    pub fn leaf(label: &str, height: f64) -> Self {
        Self {
            height: Some(height),
            label: Some(label.to_string()),
            leaf: true,
            ..Default::default()
        }
    }

    /// Convenience constructor for an internal node with two children.
    pub fn internal(height: f64, left: NodeSpec, right: NodeSpec) -> Self {
        Self {
            height: Some(height),
            children: vec![left, right],
            ..Default::default()
        }
    }
}

/// A rooted, strictly binary dendrogram with postorder node indices.
///
/// The tree is immutable after construction; all analysis functions take it
/// by shared reference and write their per-node results into dense arrays
/// aligned to the node indices. Dropping the tree releases children before
/// parents; no partial release is observable.
#[derive(Debug, Clone)]
pub struct DendroTree {
    root: DendroNode,
    node_count: usize,
}

impl DendroTree {
    /// Build a tree from a nested [`NodeSpec`], applying attribute defaults,
    /// hashing labels, and assigning postorder indices.
    ///
    /// # Errors
    ///
    /// Returns an error if a node marked `leaf` has children, or an internal
    /// node does not have exactly two children (the tree must be strictly
    /// binary).
    ///
    /// # Example
    ///
    /// ```
    /// use dendra_phylo::tree::{DendroTree, NodeSpec};
    ///
    /// let spec = NodeSpec::internal(
    ///     2.0,
    ///     NodeSpec::internal(1.0, NodeSpec::leaf("A", 0.0), NodeSpec::leaf("B", 0.0)),
    ///     NodeSpec::leaf("C", 0.0),
    /// );
    /// let tree = DendroTree::from_spec(&spec).unwrap();
    /// assert_eq!(tree.node_count(), 5);
    /// assert_eq!(tree.root().index, 4); // root takes the maximum index
    /// ```
    pub fn from_spec(spec: &NodeSpec) -> Result<Self> {
        let mut root = convert_spec(spec)?;
        let node_count = assign_indices(&mut root, 0);
        Ok(Self { root, node_count })
    }

    /// The root node.
    pub fn root(&self) -> &DendroNode {
        &self.root
    }

    /// Total number of nodes; equals the root's index plus one.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of leaf nodes.
    pub fn leaf_count(&self) -> usize {
        fn walk(node: &DendroNode) -> usize {
            if node.is_leaf() {
                return 1;
            }
            let l = node.left.as_deref().map_or(0, walk);
            let r = node.right.as_deref().map_or(0, walk);
            l + r
        }
        walk(&self.root)
    }

    /// Hashed labels of all leaves, in postorder.
    pub fn leaf_hashes(&self) -> Vec<u32> {
        fn walk(node: &DendroNode, out: &mut Vec<u32>) {
            if let Some(l) = node.left.as_deref() {
                walk(l, out);
            }
            if let Some(r) = node.right.as_deref() {
                walk(r, out);
            }
            if node.is_leaf() {
                if let Some(h) = node.label {
                    out.push(h);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.root, &mut out);
        out
    }
}

impl Summarizable for DendroTree {
    fn summary(&self) -> String {
        let leaves = self.leaf_count();
        let internal = self.node_count - leaves;
        format!(
            "DendroTree: {} nodes ({} leaves, {} internal)",
            self.node_count, leaves, internal
        )
    }
}

/// Recursively convert a [`NodeSpec`] into an owned node, applying defaults.
fn convert_spec(spec: &NodeSpec) -> Result<DendroNode> {
    let height = spec.height.unwrap_or(0.0);
    let members = spec.members.unwrap_or(1);
    let label = spec.label.as_deref().map(hash_label);

    if spec.leaf {
        if !spec.children.is_empty() {
            return Err(DendraError::InvalidInput(
                "leaf node must not have children".into(),
            ));
        }
        return Ok(DendroNode {
            height,
            index: 0,
            members,
            label,
            left: None,
            right: None,
        });
    }

    if spec.children.len() != 2 {
        return Err(DendraError::InvalidInput(format!(
            "internal node must have exactly 2 children, got {}",
            spec.children.len()
        )));
    }

    let left = convert_spec(&spec.children[0])?;
    let right = convert_spec(&spec.children[1])?;
    Ok(DendroNode {
        height,
        index: 0,
        members,
        label,
        left: Some(Box::new(left)),
        right: Some(Box::new(right)),
    })
}

/// Assign postorder indices starting at `next`; returns the count of nodes
/// numbered so far (the node itself receives index `count - 1`).
fn assign_indices(node: &mut DendroNode, next: usize) -> usize {
    let mut next = next;
    if let Some(l) = node.left.as_deref_mut() {
        next = assign_indices(l, next);
    }
    if let Some(r) = node.right.as_deref_mut() {
        next = assign_indices(r, next);
    }
    node.index = next;
    next + 1
}

/// A set of taxa expressing the trait under study, stored as hashed labels.
#[derive(Debug, Clone, Default)]
pub struct PresenceSet {
    hashes: HashSet<u32>,
}

impl PresenceSet {
    /// Build from taxon label strings, hashing each one.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Self {
        Self {
            hashes: labels.iter().map(|s| hash_label(s.as_ref())).collect(),
        }
    }

    /// Build from pre-hashed label identifiers.
    pub fn from_hashes<I: IntoIterator<Item = u32>>(hashes: I) -> Self {
        Self {
            hashes: hashes.into_iter().collect(),
        }
    }

    /// Whether a leaf with the given (optional) hashed label is present.
    /// Unlabeled leaves are never present.
    pub fn contains(&self, label: Option<u32>) -> bool {
        label.is_some_and(|h| self.hashes.contains(&h))
    }

    /// Number of distinct taxa in the set.
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// True if no taxa are present.
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ((A,B):1.0, C):2.0
    fn three_leaf_spec() -> NodeSpec {
        NodeSpec::internal(
            2.0,
            NodeSpec::internal(1.0, NodeSpec::leaf("A", 0.0), NodeSpec::leaf("B", 0.0)),
            NodeSpec::leaf("C", 0.0),
        )
    }

    #[test]
    fn postorder_indices_are_a_bijection() {
        let tree = DendroTree::from_spec(&three_leaf_spec()).unwrap();
        let mut seen = vec![false; tree.node_count()];
        fn walk(node: &DendroNode, seen: &mut [bool]) {
            assert!(node.index < seen.len(), "index out of range");
            assert!(!seen[node.index], "duplicate index {}", node.index);
            seen[node.index] = true;
            if let Some(l) = node.left.as_deref() {
                assert!(l.index < node.index, "child indexed after parent");
                walk(l, seen);
            }
            if let Some(r) = node.right.as_deref() {
                assert!(r.index < node.index, "child indexed after parent");
                walk(r, seen);
            }
        }
        walk(tree.root(), &mut seen);
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn root_takes_maximum_index() {
        let tree = DendroTree::from_spec(&three_leaf_spec()).unwrap();
        assert_eq!(tree.root().index, tree.node_count() - 1);
        assert_eq!(tree.node_count(), 5);
    }

    #[test]
    fn attribute_defaults() {
        let spec = NodeSpec {
            leaf: true,
            ..Default::default()
        };
        let tree = DendroTree::from_spec(&spec).unwrap();
        assert_eq!(tree.root().height, 0.0);
        assert_eq!(tree.root().members, 1);
        assert_eq!(tree.root().label, None);
    }

    #[test]
    fn leaf_with_children_rejected() {
        let spec = NodeSpec {
            leaf: true,
            children: vec![NodeSpec::leaf("A", 0.0)],
            ..Default::default()
        };
        assert!(DendroTree::from_spec(&spec).is_err());
    }

    #[test]
    fn non_binary_internal_rejected() {
        let spec = NodeSpec {
            children: vec![
                NodeSpec::leaf("A", 0.0),
                NodeSpec::leaf("B", 0.0),
                NodeSpec::leaf("C", 0.0),
            ],
            ..Default::default()
        };
        assert!(DendroTree::from_spec(&spec).is_err());
    }

    #[test]
    fn leaf_counts_and_summary() {
        let tree = DendroTree::from_spec(&three_leaf_spec()).unwrap();
        assert_eq!(tree.leaf_count(), 3);
        assert_eq!(tree.summary(), "DendroTree: 5 nodes (3 leaves, 2 internal)");
    }

    #[test]
    fn leaf_hashes_in_postorder() {
        let tree = DendroTree::from_spec(&three_leaf_spec()).unwrap();
        let hashes = tree.leaf_hashes();
        assert_eq!(
            hashes,
            vec![hash_label("A"), hash_label("B"), hash_label("C")]
        );
    }

    #[test]
    fn presence_set_membership() {
        let set = PresenceSet::from_labels(&["A", "B"]);
        assert_eq!(set.len(), 2);
        assert!(set.contains(Some(hash_label("A"))));
        assert!(!set.contains(Some(hash_label("C"))));
        assert!(!set.contains(None));
    }

    #[test]
    fn single_leaf_tree() {
        let tree = DendroTree::from_spec(&NodeSpec::leaf("A", 0.0)).unwrap();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.root().index, 0);
        assert!(tree.root().is_leaf());
    }
}
