//! Null-distribution generators for the phylogenetic signal statistic.
//!
//! Builds reference distributions for the D statistic under two null models,
//! each returning the mean statistic over a batch of trials:
//!
//! - [`permutation_null`] — shuffles the taxon pool and rescores a random
//!   presence set of the observed size
//! - [`brownian_null`] — simulates continuous Brownian-motion trait
//!   evolution down the tree and thresholds leaves into a presence set
//!
//! Both take an explicitly seeded [`TraitRng`] handle by mutable reference,
//! so exclusive use per batch is compiler-enforced.

use dendra_core::{DendraError, Result};

use crate::signal::d_statistic;
use crate::tree::{DendroNode, DendroTree, PresenceSet};

// ── TraitRng ───────────────────────────────────────────────────────────────

/// Minimal xorshift64 PRNG handle for reproducible trials without external
/// deps. Seeded explicitly; a zero seed is remapped to keep the state
/// nonzero.
#[derive(Debug, Clone)]
pub struct TraitRng {
    state: u64,
}

impl TraitRng {
    /// Create a generator from an explicit seed.
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    fn next_f64(&mut self) -> f64 {
        self.next_u64() as f64 / u64::MAX as f64
    }

    /// Zero-mean Gaussian sample with standard deviation `sd`, via the
    /// Box-Muller transform.
    pub fn gaussian(&mut self, sd: f64) -> f64 {
        let u1 = self.next_f64().max(1e-300); // avoid log(0)
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        sd * z
    }

    /// Uniform in-place Fisher-Yates shuffle.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        let n = items.len();
        for i in (1..n).rev() {
            let j = (self.next_u64() as usize) % (i + 1);
            items.swap(i, j);
        }
    }
}

// ── Permutation null ───────────────────────────────────────────────────────

/// Mean D statistic over `iterations` random permutation trials.
///
/// Each trial shuffles the full hashed pool of `labels` and takes the first
/// `n_present` as the simulated presence set. With `iterations == 1` and
/// `n_present == labels.len()` this degenerates to a direct scoring call,
/// since the shuffled pool taken whole is the same set.
///
/// # Errors
///
/// Returns an error if `iterations` is zero or `n_present` exceeds the pool
/// size.
pub fn permutation_null<S: AsRef<str>>(
    tree: &DendroTree,
    labels: &[S],
    n_present: usize,
    iterations: usize,
    rng: &mut TraitRng,
) -> Result<f64> {
    if iterations == 0 {
        return Err(DendraError::InvalidInput("iterations must be > 0".into()));
    }
    if n_present > labels.len() {
        return Err(DendraError::InvalidInput(format!(
            "n_present ({}) exceeds label pool size ({})",
            n_present,
            labels.len()
        )));
    }

    let mut pool: Vec<u32> = labels
        .iter()
        .map(|s| dendra_core::hash_label(s.as_ref()))
        .collect();

    let mut total = 0.0;
    for _ in 0..iterations {
        rng.shuffle(&mut pool);
        let presence = PresenceSet::from_hashes(pool[..n_present].iter().copied());
        total += d_statistic(tree, &presence);
    }
    Ok(total / iterations as f64)
}

// ── Brownian-motion null ───────────────────────────────────────────────────

/// Simulate a continuous trait down the tree under Brownian motion.
///
/// The root starts at `start`; each child's value is its parent's plus a
/// zero-mean Gaussian perturbation with standard deviation
/// `sd * |parentHeight − childHeight|`. Returns the per-node values,
/// index-aligned.
pub fn propagate_brownian(
    tree: &DendroTree,
    start: f64,
    sd: f64,
    rng: &mut TraitRng,
) -> Vec<f64> {
    fn walk(node: &DendroNode, value: f64, sd: f64, rng: &mut TraitRng, values: &mut [f64]) {
        values[node.index] = value;
        let h = node.height;
        if let Some(left) = node.left.as_deref() {
            let offset = rng.gaussian(sd * (h - left.height).abs());
            walk(left, value + offset, sd, rng, values);
        }
        if let Some(right) = node.right.as_deref() {
            let offset = rng.gaussian(sd * (h - right.height).abs());
            walk(right, value + offset, sd, rng, values);
        }
    }

    let mut values = vec![0.0; tree.node_count()];
    walk(tree.root(), start, sd, rng, &mut values);
    values
}

/// Mean D statistic over `iterations` Brownian-motion trials.
///
/// Each trial propagates a continuous trait from `start` with rate `sd`,
/// marks every labeled leaf whose value exceeds `threshold` as present, and
/// scores the resulting presence set.
///
/// # Errors
///
/// Returns an error if `iterations` is zero.
pub fn brownian_null(
    tree: &DendroTree,
    iterations: usize,
    sd: f64,
    start: f64,
    threshold: f64,
    rng: &mut TraitRng,
) -> Result<f64> {
    if iterations == 0 {
        return Err(DendraError::InvalidInput("iterations must be > 0".into()));
    }

    fn collect_present(node: &DendroNode, values: &[f64], threshold: f64, out: &mut Vec<u32>) {
        if node.is_leaf() {
            if values[node.index] > threshold {
                if let Some(label) = node.label {
                    out.push(label);
                }
            }
            return;
        }
        if let Some(left) = node.left.as_deref() {
            collect_present(left, values, threshold, out);
        }
        if let Some(right) = node.right.as_deref() {
            collect_present(right, values, threshold, out);
        }
    }

    let mut total = 0.0;
    let mut present = Vec::with_capacity(tree.leaf_count());
    for _ in 0..iterations {
        let values = propagate_brownian(tree, start, sd, rng);
        present.clear();
        collect_present(tree.root(), &values, threshold, &mut present);
        let presence = PresenceSet::from_hashes(present.iter().copied());
        total += d_statistic(tree, &presence);
    }
    Ok(total / iterations as f64)
}

// ── Tests ──────────────────────────────────────────────────────────────────
