//! Leaf-level indexing: postings, exact-match snapshots and autocomplete.

mod leaf;
mod snapshot;

pub(crate) use leaf::LeafInner;
pub use leaf::{LeafIndex, RebuildOutcome};
pub use snapshot::LeafSnapshot;

#[cfg(test)]
mod snapshot_tests;
