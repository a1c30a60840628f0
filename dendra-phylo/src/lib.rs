//! Trait-history analysis on binary dendrograms for the Dendra ecosystem.
//!
//! Given a rooted, strictly binary tree of taxa and the set of taxa
//! expressing a binary trait, this crate reconstructs and compares
//! evolutionary character histories:
//!
//! - **Tree model** — immutable dendrogram with postorder node indices
//!   usable directly as dense array offsets ([`tree`])
//! - **Ancestral reconstruction** — Fitch parsimony up/down/reconcile
//!   phases and gain/loss event extraction ([`reconstruct`])
//! - **Phylogenetic signal** — sister-clade scoring and the D statistic
//!   ([`signal`])
//! - **Null models** — permutation and Brownian-motion reference
//!   distributions with an explicit seedable RNG handle ([`null_model`])
//! - **History comparison** — cross-reconstruction concordance search and
//!   simple Jaccard/Hamming scores ([`compare`])
//!
//! All per-call state lives in caller-owned arrays indexed by node index;
//! the tree itself is read-only shared state after construction.

pub mod compare;
pub mod null_model;
pub mod reconstruct;
pub mod signal;
pub mod tree;

pub use compare::{concordance, concordance_node_scores, hamming, jaccard};
pub use null_model::{brownian_null, permutation_null, propagate_brownian, TraitRng};
pub use reconstruct::{gain_loss, reconstruct, AncestralStates, GainLoss, TriState};
pub use signal::{clade_signals, d_statistic, signal_statistic};
pub use tree::{DendroNode, DendroTree, NodeSpec, PresenceSet};
