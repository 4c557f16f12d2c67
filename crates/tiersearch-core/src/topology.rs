//! Wiring of the standard two-level shard tree.
//!
//! ```text
//! SearchTree ── NodeEngine ──┬── ShardEngine ──┬── LeafIndex
//!                            │                 └── LeafIndex ...
//!                            └── ShardEngine ...
//! ```

use std::ops::Deref;
use std::sync::Arc;

use crate::cluster::{ClusterEngine, FanoutPool, LevelSettings};
use crate::config::{RebuildMode, TierConfig};
use crate::entry::SearchEntry;
use crate::error::Result;
use crate::index::LeafIndex;
use crate::maintainer::TrieMaintainer;

/// Engine whose children are leaf indexes.
pub type ShardEngine = ClusterEngine<LeafIndex>;

/// Engine whose children are shard engines.
pub type NodeEngine = ClusterEngine<ShardEngine>;

/// Builds a shard engine whose leaves rebuild inline, or through
/// `maintainer` when one is given.
pub fn build_shard_engine(
    settings: LevelSettings,
    pool: FanoutPool,
    maintainer: Option<Arc<TrieMaintainer>>,
) -> ShardEngine {
    ClusterEngine::new("shard", settings, pool, move || match &maintainer {
        Some(m) => LeafIndex::with_maintainer(Arc::clone(m)),
        None => LeafIndex::new(),
    })
}

/// A ready-to-use node → shard → leaf tree built from [`TierConfig`].
///
/// Dereferences to the top-level [`NodeEngine`], so every
/// [`SearchEntry`] operation is available directly.
#[derive(Debug)]
pub struct SearchTree {
    config: TierConfig,
    node: NodeEngine,
    maintainer: Option<Arc<TrieMaintainer>>,
}

impl SearchTree {
    /// Validates `config` and builds the tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) for an invalid
    /// configuration and [`Error::WorkerPool`](crate::Error::WorkerPool) if
    /// a pool or the maintainer cannot start.
    pub fn build(config: &TierConfig) -> Result<Self> {
        config.validate()?;
        let topology = &config.topology;
        let threads = config.search.fanout_threads;

        let node_pool = FanoutPool::new("node", threads)?;
        let shard_pool = FanoutPool::new("shard", threads)?;
        let maintainer = match config.maintainer.rebuild {
            RebuildMode::Deferred => Some(TrieMaintainer::start(config.maintainer.workers)?),
            RebuildMode::Inline => None,
        };

        let shard_settings = LevelSettings::new(topology.shard_fanout, topology.leaf_capacity);
        let node_settings = LevelSettings {
            fanout: topology.node_fanout,
            capacity_per_child: topology.shard_capacity,
        };
        let leaf_maintainer = maintainer.clone();
        let node = ClusterEngine::new("node", node_settings, node_pool, move || {
            build_shard_engine(shard_settings, shard_pool.clone(), leaf_maintainer.clone())
        });

        tracing::info!(
            node_fanout = topology.node_fanout,
            shard_fanout = topology.shard_fanout,
            leaf_capacity = topology.leaf_capacity,
            rebuild = ?config.maintainer.rebuild,
            "search tree built"
        );
        Ok(Self {
            config: config.clone(),
            node,
            maintainer,
        })
    }

    /// Configuration the tree was built from.
    #[must_use]
    pub fn config(&self) -> &TierConfig {
        &self.config
    }

    /// Top-level engine.
    #[must_use]
    pub fn node(&self) -> &NodeEngine {
        &self.node
    }

    /// Background maintainer, present in deferred rebuild mode.
    #[must_use]
    pub fn maintainer(&self) -> Option<&Arc<TrieMaintainer>> {
        self.maintainer.as_ref()
    }

    /// Suggestions capped at the configured default limit.
    #[must_use]
    pub fn autocomplete(&self, prefix: &str) -> Vec<String> {
        self.node
            .suggest(prefix, self.config.search.default_suggest_limit)
    }

    /// Waits until every scheduled background rebuild has been applied.
    /// No-op in inline mode.
    pub fn sync(&self) {
        if let Some(maintainer) = &self.maintainer {
            maintainer.drain();
        }
    }

    /// Stops the maintainer after it has applied every queued rebuild.
    /// Later writes rebuild inline.
    pub fn shutdown(&self) {
        if let Some(maintainer) = &self.maintainer {
            maintainer.shutdown();
        }
    }
}

impl Deref for SearchTree {
    type Target = NodeEngine;

    fn deref(&self) -> &Self::Target {
        &self.node
    }
}
