//! Recursive sharding layer.
//!
//! A [`ClusterEngine`] owns a set of children that are themselves search
//! entries, so engines stack into a tree of any depth.

mod engine;
mod pool;

pub use engine::{ClusterEngine, ClusterStats, EntryFactory, LevelSettings};
pub use pool::FanoutPool;
