//! Taxon label hashing.
//!
//! Maps UTF-8 taxon labels to 32-bit identifiers so tree algorithms can
//! compare labels with integer equality instead of string comparison.
//! The hash is a rolling XOR/rotate: equal strings always hash equal;
//! collisions between distinct labels are an accepted approximation, not
//! a correctness requirement for the callers.

/// Seed for the rolling label hash.
const HASH_SEED: u32 = 0x5555_5555;

/// Hash a taxon label to its 32-bit identifier.
///
/// Each UTF-8 byte is XORed into the accumulator, which is then rotated
/// left by 5 bits. Deterministic across platforms and runs.
///
/// # Example
///
/// ```
/// use dendra_core::hash::hash_label;
///
/// assert_eq!(hash_label("Escherichia_coli"), hash_label("Escherichia_coli"));
/// assert_ne!(hash_label("A"), hash_label("B"));
/// ```
pub fn hash_label(label: &str) -> u32 {
    let mut result = HASH_SEED;
    for &b in label.as_bytes() {
        result ^= u32::from(b);
        result = result.rotate_left(5);
    }
    result
}
