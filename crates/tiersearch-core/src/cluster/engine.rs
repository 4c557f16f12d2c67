//! Generic sharding engine: routes writes, freezes full children and fans
//! reads out across every active and frozen child.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use rayon::prelude::*;
use rustc_hash::FxHasher;

use super::pool::FanoutPool;
use crate::cancel::CancellationToken;
use crate::entry::{DocumentCounts, SearchEntry};
use crate::error::{Error, Result};
use crate::merge::{merge_counts, OrderedSuggestions};

/// Creates fresh children for an engine; the only per-level customization.
///
/// Implemented for any `Fn() -> C` closure.
pub trait EntryFactory<C>: Send + Sync {
    /// Builds a new, empty child.
    fn create_entry(&self) -> C;
}

impl<C, F> EntryFactory<C> for F
where
    F: Fn() -> C + Send + Sync,
{
    fn create_entry(&self) -> C {
        self()
    }
}

/// Shape of one engine level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSettings {
    /// Children created eagerly at construction. With 0 the first write
    /// creates slot 0 lazily and the engine stays single-slot.
    pub fanout: usize,
    /// Child `size()` at which the child is frozen; `None` never freezes.
    pub capacity_per_child: Option<usize>,
}

impl LevelSettings {
    /// Settings with a freeze threshold.
    #[must_use]
    pub const fn new(fanout: usize, capacity_per_child: usize) -> Self {
        Self {
            fanout,
            capacity_per_child: Some(capacity_per_child),
        }
    }

    /// Settings for a level whose children are never frozen.
    #[must_use]
    pub const fn unbounded(fanout: usize) -> Self {
        Self {
            fanout,
            capacity_per_child: None,
        }
    }
}

/// Point-in-time counters of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClusterStats {
    /// Writable children.
    pub active_children: usize,
    /// Retired, read-only children.
    pub frozen_children: usize,
    /// Distinct words across the whole subtree.
    pub indexed_words: usize,
}

struct ChildRef<C> {
    slot: usize,
    frozen: bool,
    entry: Arc<C>,
}

/// Sharding engine over children of type `C`.
///
/// Engines nest: a `ClusterEngine<ClusterEngine<LeafIndex>>` is a two-level
/// tree. Every operation is safe to call from many threads at once.
pub struct ClusterEngine<C> {
    label: String,
    settings: LevelSettings,
    pool: FanoutPool,
    factory: Arc<dyn EntryFactory<C>>,
    active: DashMap<usize, Arc<C>>,
    // Append-only per slot; a retired child never returns to `active`.
    frozen: DashMap<usize, Vec<Arc<C>>>,
}

impl<C> fmt::Debug for ClusterEngine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterEngine")
            .field("label", &self.label)
            .field("settings", &self.settings)
            .field("pool", &self.pool)
            .field("active", &self.active.len())
            .field(
                "frozen",
                &self.frozen.iter().map(|s| s.value().len()).sum::<usize>(),
            )
            .finish_non_exhaustive()
    }
}

impl<C: SearchEntry + 'static> ClusterEngine<C> {
    /// Creates an engine and eagerly builds `settings.fanout` children.
    pub fn new<F>(
        label: impl Into<String>,
        settings: LevelSettings,
        pool: FanoutPool,
        factory: F,
    ) -> Self
    where
        F: EntryFactory<C> + 'static,
    {
        let active = DashMap::with_capacity(settings.fanout);
        for slot in 0..settings.fanout {
            active.insert(slot, Arc::new(factory.create_entry()));
        }
        Self {
            label: label.into(),
            settings,
            pool,
            factory: Arc::new(factory),
            active,
            frozen: DashMap::new(),
        }
    }

    /// Level label used in logs.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Settings this engine was built with.
    #[must_use]
    pub fn settings(&self) -> LevelSettings {
        self.settings
    }

    /// Total retired children across all slots.
    #[must_use]
    pub fn frozen_count(&self) -> usize {
        self.frozen.iter().map(|slot| slot.value().len()).sum()
    }

    /// Counters for observability and tests.
    #[must_use]
    pub fn stats(&self) -> ClusterStats {
        ClusterStats {
            active_children: self.active.len(),
            frozen_children: self.frozen_count(),
            indexed_words: self.indexed_words(),
        }
    }

    /// Active children by slot, then frozen ones by slot and age, each
    /// cloned out so no map lock is held while they run.
    fn children(&self) -> Vec<ChildRef<C>> {
        let mut children: Vec<ChildRef<C>> = self
            .active
            .iter()
            .map(|e| ChildRef {
                slot: *e.key(),
                frozen: false,
                entry: Arc::clone(e.value()),
            })
            .collect();
        children.sort_unstable_by_key(|child| child.slot);

        let mut frozen: Vec<(usize, Vec<Arc<C>>)> = self
            .frozen
            .iter()
            .map(|slot| (*slot.key(), slot.value().clone()))
            .collect();
        frozen.sort_unstable_by_key(|(slot, _)| *slot);
        for (slot, entries) in frozen {
            children.extend(entries.into_iter().map(|entry| ChildRef {
                slot,
                frozen: true,
                entry,
            }));
        }
        children
    }

    fn search_child(&self, child: &ChildRef<C>, word: &str) -> DocumentCounts {
        match catch_unwind(AssertUnwindSafe(|| child.entry.search_documents(word))) {
            Ok(Ok(found)) => found,
            Ok(Err(e)) => {
                tracing::warn!(
                    engine = %self.label,
                    slot = child.slot,
                    frozen = child.frozen,
                    error = %e,
                    "child search failed, treating as empty"
                );
                DocumentCounts::default()
            }
            Err(_) => {
                tracing::warn!(
                    engine = %self.label,
                    slot = child.slot,
                    frozen = child.frozen,
                    "child search panicked, treating as empty"
                );
                DocumentCounts::default()
            }
        }
    }
}

/// Bucket for `name` among `slots` active children.
pub(super) fn slot_for(name: &str, slots: usize) -> usize {
    let mut hasher = FxHasher::default();
    name.hash(&mut hasher);
    (hasher.finish() % slots as u64) as usize
}

impl<C: SearchEntry + 'static> SearchEntry for ClusterEngine<C> {
    fn add_document(&self, name: &str, text: &str) -> Result<bool> {
        if name.is_empty() {
            return Err(Error::empty_argument("document name"));
        }

        // Read before taking the entry: `len` locks every shard.
        let slots = self.active.len().max(1);
        let slot = slot_for(name, slots);

        // Freeze-and-replace is atomic under the slot entry. The entry is
        // released before delegating, so readers and other writers never
        // wait on a child's write.
        let child = {
            let mut entry = self
                .active
                .entry(slot)
                .or_insert_with(|| Arc::new(self.factory.create_entry()));
            if let Some(capacity) = self.settings.capacity_per_child {
                if entry.size() >= capacity {
                    let fresh = Arc::new(self.factory.create_entry());
                    let retired = std::mem::replace(entry.value_mut(), fresh);
                    self.frozen.entry(slot).or_default().push(retired);
                    tracing::debug!(engine = %self.label, slot, capacity, "froze full child");
                }
            }
            Arc::clone(entry.value())
        };
        child.add_document(name, text)
    }

    fn search_documents(&self, word: &str) -> Result<DocumentCounts> {
        if word.is_empty() {
            return Err(Error::empty_argument("query word"));
        }

        let children = self.children();
        let merged = self.pool.install(|| {
            children
                .par_iter()
                .map(|child| self.search_child(child, word))
                .reduce(DocumentCounts::default, |mut acc, part| {
                    merge_counts(&mut acc, part);
                    acc
                })
        });
        Ok(merged)
    }

    fn suggest_with_cancel(
        &self,
        prefix: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Vec<String> {
        if prefix.is_empty() || limit == 0 || cancel.is_cancelled() {
            return Vec::new();
        }

        let children = self.children();
        let local = cancel.child();
        let merge = Mutex::new(OrderedSuggestions::new(children.len(), limit));
        self.pool.scope(|scope| {
            for (index, child) in children.iter().enumerate() {
                let local = &local;
                let merge = &merge;
                scope.spawn(move |_| {
                    let found = if local.is_cancelled() {
                        Vec::new()
                    } else {
                        catch_unwind(AssertUnwindSafe(|| {
                            child.entry.suggest_with_cancel(prefix, limit, local)
                        }))
                        .unwrap_or_else(|_| {
                            tracing::warn!(
                                engine = %self.label,
                                slot = child.slot,
                                frozen = child.frozen,
                                "child suggest panicked, treating as empty"
                            );
                            Vec::new()
                        })
                    };
                    if merge.lock().complete(index, found) {
                        local.cancel();
                    }
                });
            }
        });

        if local.is_cancelled() && !cancel.is_cancelled() {
            tracing::trace!(
                engine = %self.label,
                limit,
                "suggest limit reached, cancelled remaining children"
            );
        }
        merge.into_inner().into_vec()
    }

    fn size(&self) -> usize {
        self.active.len()
    }

    fn indexed_words(&self) -> usize {
        self.children()
            .iter()
            .map(|child| child.entry.indexed_words())
            .sum()
    }
}
