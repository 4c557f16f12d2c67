//! # `tiersearch` Core
//!
//! Hierarchically sharded, in-process full-text search index.
//!
//! Documents are routed by name through a tree of sharding engines down to
//! leaf inverted indexes. Leaves keep per-word document counts, an
//! exact-match automaton and a sorted word set for autocomplete. Full leaves
//! are frozen and replaced, so write cost stays bounded as the corpus grows,
//! while reads fan out in parallel across every active and frozen child.
//!
//! ## Features
//!
//! - **Recursive sharding**: [`ClusterEngine`] wraps any [`SearchEntry`],
//!   including other engines
//! - **Bounded leaves**: children freeze at a configurable capacity
//! - **Deferred rebuilds**: [`TrieMaintainer`] moves autocomplete rebuilds
//!   off the write path
//! - **Early-terminating suggest**: fan-out stops once enough distinct
//!   suggestions are collected
//!
//! ## Quick Start
//!
//! ```rust
//! use tiersearch_core::{SearchEntry, SearchTree, TierConfig};
//!
//! let tree = SearchTree::build(&TierConfig::default())?;
//! tree.add_document("notes.txt", "rust search engines in rust")?;
//!
//! let hits = tree.search_documents("rust")?;
//! assert_eq!(hits.get("notes.txt"), Some(&2));
//! assert_eq!(tree.suggest("se", 5), vec!["search"]);
//! # Ok::<(), tiersearch_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::significant_drop_in_scrutinee)]
#![allow(clippy::redundant_pub_crate)]
#![allow(clippy::missing_const_for_fn)]

pub mod cancel;
pub mod cluster;
pub mod config;
#[cfg(test)]
mod config_tests;
pub mod entry;
pub mod error;
pub mod index;
pub mod maintainer;
pub mod merge;
pub mod topology;

pub use cancel::CancellationToken;
pub use cluster::{ClusterEngine, ClusterStats, EntryFactory, FanoutPool, LevelSettings};
pub use config::{ConfigError, RebuildMode, TierConfig};
pub use entry::{DocumentCounts, SearchEntry, DEFAULT_SUGGEST_LIMIT};
pub use error::{Error, Result};
pub use index::{LeafIndex, LeafSnapshot, RebuildOutcome};
pub use maintainer::TrieMaintainer;
pub use merge::{merge_counts, OrderedSuggestions, SuggestionCollector};
pub use topology::{build_shard_engine, NodeEngine, SearchTree, ShardEngine};
