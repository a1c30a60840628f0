//! Shared primitives and traits for the Dendra phylogenetics ecosystem.
//!
//! `dendra-core` provides the foundation that the other Dendra crates build on:
//!
//! - **Error types** — [`DendraError`] and [`Result`] for structured error handling
//! - **Traits** — Core abstractions like [`Summarizable`]
//! - **Label hashing** — Deterministic 32-bit taxon identifiers

pub mod error;
pub mod hash;
pub mod traits;

pub use error::{DendraError, Result};
pub use hash::hash_label;
pub use traits::*;
