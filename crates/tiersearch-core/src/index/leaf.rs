//! Leaf inverted index: postings plus the structures behind autocomplete.
//!
//! A word becomes visible in stages. Its posting counts update before
//! `add_document` returns; it then waits in the pending queue until a
//! rebuild moves it into the prefix set (autocomplete sees it) and finally
//! into the next published exact-match snapshot (search sees it).
//!
//! Rebuilds are single-flight per leaf. A caller that finds one in flight
//! returns at once; the running rebuild re-checks the queue after it
//! releases the flag, so a word is never left stranded.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use arc_swap::ArcSwap;
use crossbeam_channel::{Receiver, Sender};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use super::snapshot::{LeafSnapshot, MatchSnapshot};
use crate::cancel::CancellationToken;
use crate::config::RebuildMode;
use crate::entry::{DocumentCounts, SearchEntry};
use crate::error::{Error, Result};
use crate::maintainer::TrieMaintainer;

/// What a call to [`LeafIndex::incorporate_pending_words`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// New words were added and a fresh exact-match snapshot published.
    Published {
        /// Words that were not indexed before this rebuild.
        new_words: usize,
    },
    /// The queue held nothing new; the current snapshot stays.
    Unchanged,
    /// Another rebuild was in flight and will pick up the queue.
    Skipped,
}

/// Holds the single-flight flag for as long as it lives.
///
/// Dropping it clears the flag, on unwinding too.
pub(crate) struct RebuildGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RebuildGuard<'a> {
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for RebuildGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Shared state of a leaf; background rebuild jobs hold a weak reference.
#[derive(Debug)]
pub(crate) struct LeafInner {
    /// word -> document -> occurrences. Counts only ever grow.
    postings: DashMap<String, DashMap<String, AtomicU64>>,
    pending_tx: Sender<String>,
    pending_rx: Receiver<String>,
    /// Every incorporated word, in incorporation order; automaton input.
    keywords: Mutex<Vec<String>>,
    prefixes: RwLock<BTreeSet<String>>,
    published: ArcSwap<MatchSnapshot>,
    rebuild_in_flight: AtomicBool,
}

impl LeafInner {
    fn new() -> Self {
        let (pending_tx, pending_rx) = crossbeam_channel::unbounded();
        Self {
            postings: DashMap::new(),
            pending_tx,
            pending_rx,
            keywords: Mutex::new(Vec::new()),
            prefixes: RwLock::new(BTreeSet::new()),
            published: ArcSwap::from_pointee(MatchSnapshot::empty()),
            rebuild_in_flight: AtomicBool::new(false),
        }
    }

    fn record(&self, word: &str, document: &str, occurrences: u64) {
        if let Some(docs) = self.postings.get(word) {
            bump(&docs, document, occurrences);
            return;
        }
        let docs = self.postings.entry(word.to_owned()).or_default().downgrade();
        bump(&docs, document, occurrences);
    }

    fn enqueue(&self, word: String) -> Result<()> {
        self.pending_tx
            .send(word)
            .map_err(|_| Error::Internal("pending-word queue disconnected".to_string()))
    }

    pub(crate) fn incorporate_pending_words(&self) -> Result<RebuildOutcome> {
        let mut new_words = 0;
        let mut ran = false;
        loop {
            let Some(guard) = RebuildGuard::acquire(&self.rebuild_in_flight) else {
                break;
            };
            ran = true;
            new_words += self.rebuild_locked()?;
            drop(guard);
            if self.pending_rx.is_empty() {
                break;
            }
        }

        Ok(match (ran, new_words) {
            (false, 0) => RebuildOutcome::Skipped,
            (_, 0) => RebuildOutcome::Unchanged,
            (_, n) => RebuildOutcome::Published { new_words: n },
        })
    }

    /// Drains the queue and republishes; caller holds the rebuild flag.
    fn rebuild_locked(&self) -> Result<usize> {
        let mut keywords = self.keywords.lock();
        let before = keywords.len();
        {
            let mut prefixes = self.prefixes.write();
            for word in self.pending_rx.try_iter() {
                if prefixes.insert(word.clone()) {
                    keywords.push(word);
                }
            }
        }
        let added = keywords.len() - before;
        // A failed build leaves words incorporated but unpublished.
        if self.published.load().len() == keywords.len() {
            return Ok(added);
        }

        let snapshot = MatchSnapshot::build(&keywords).inspect_err(|e| {
            tracing::error!(error = %e, keywords = keywords.len(), "exact-match rebuild failed");
        })?;
        self.published.store(Arc::new(snapshot));
        tracing::debug!(
            new_words = added,
            keywords = keywords.len(),
            "published exact-match snapshot"
        );
        Ok(added)
    }
}

fn bump(docs: &DashMap<String, AtomicU64>, document: &str, occurrences: u64) {
    if let Some(count) = docs.get(document) {
        count.fetch_add(occurrences, Ordering::Relaxed);
        return;
    }
    docs.entry(document.to_owned())
        .or_insert_with(|| AtomicU64::new(0))
        .fetch_add(occurrences, Ordering::Relaxed);
}

/// Terminal node of the shard tree.
///
/// Thread-safe: writers, readers and rebuilds may run concurrently.
///
/// # Example
///
/// ```
/// use tiersearch_core::{LeafIndex, SearchEntry};
///
/// let leaf = LeafIndex::new();
/// leaf.add_document("doc1", "hello world hello").unwrap();
///
/// let hits = leaf.search_documents("hello").unwrap();
/// assert_eq!(hits.get("doc1"), Some(&2));
/// assert_eq!(leaf.suggest("wo", 10), vec!["world"]);
/// ```
#[derive(Debug)]
pub struct LeafIndex {
    inner: Arc<LeafInner>,
    maintainer: Option<Arc<TrieMaintainer>>,
}

impl Default for LeafIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl LeafIndex {
    /// Creates an empty leaf that rebuilds inline on every write.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(LeafInner::new()),
            maintainer: None,
        }
    }

    /// Creates an empty leaf that defers rebuilds to `maintainer`.
    #[must_use]
    pub fn with_maintainer(maintainer: Arc<TrieMaintainer>) -> Self {
        Self {
            inner: Arc::new(LeafInner::new()),
            maintainer: Some(maintainer),
        }
    }

    /// Rebuilds a leaf from a postings dump.
    ///
    /// Both autocomplete structures are complete when this returns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Index`] if the exact-match automaton cannot be built.
    pub fn restore(
        snapshot: LeafSnapshot,
        maintainer: Option<Arc<TrieMaintainer>>,
    ) -> Result<Self> {
        let leaf = Self {
            inner: Arc::new(LeafInner::new()),
            maintainer,
        };
        for (word, documents) in snapshot.postings {
            for (document, count) in &documents {
                leaf.inner.record(&word, document, *count);
            }
            leaf.inner.enqueue(word)?;
        }
        leaf.inner.incorporate_pending_words()?;
        Ok(leaf)
    }

    /// Dumps every posting for an external persistence layer.
    #[must_use]
    pub fn export(&self) -> LeafSnapshot {
        let postings = self
            .inner
            .postings
            .iter()
            .map(|word| {
                let documents: BTreeMap<String, u64> = word
                    .value()
                    .iter()
                    .map(|doc| (doc.key().clone(), doc.value().load(Ordering::Relaxed)))
                    .collect();
                (word.key().clone(), documents)
            })
            .collect();
        LeafSnapshot { postings }
    }

    /// Policy this leaf applies after each write.
    #[must_use]
    pub fn rebuild_mode(&self) -> RebuildMode {
        if self.maintainer.is_some() {
            RebuildMode::Deferred
        } else {
            RebuildMode::Inline
        }
    }

    /// Words queued but not yet incorporated.
    #[must_use]
    pub fn pending_words(&self) -> usize {
        self.inner.pending_rx.len()
    }

    /// Keywords in the currently published exact-match snapshot.
    #[must_use]
    pub fn published_keywords(&self) -> usize {
        self.inner.published.load().len()
    }

    /// Moves every queued word into the prefix set and publishes a new
    /// exact-match snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Index`] if the automaton cannot be built; the words
    /// stay in the prefix set and the next successful rebuild publishes them.
    pub fn incorporate_pending_words(&self) -> Result<RebuildOutcome> {
        self.inner.incorporate_pending_words()
    }

    pub(crate) fn downgrade(&self) -> Weak<LeafInner> {
        Arc::downgrade(&self.inner)
    }

    fn refresh(&self) -> Result<()> {
        if let Some(maintainer) = &self.maintainer {
            if maintainer.schedule_rebuild(self) {
                return Ok(());
            }
            tracing::debug!("maintainer stopped, rebuilding inline");
        }
        self.inner.incorporate_pending_words().map(|_| ())
    }
}

impl SearchEntry for LeafIndex {
    fn add_document(&self, name: &str, text: &str) -> Result<bool> {
        if name.is_empty() {
            return Ok(false);
        }

        let lowered = text.to_lowercase();
        let mut occurrences: FxHashMap<&str, u64> = FxHashMap::default();
        for word in lowered.split_whitespace() {
            *occurrences.entry(word).or_insert(0) += 1;
        }
        if occurrences.is_empty() {
            return Ok(true);
        }

        for (word, count) in occurrences {
            self.inner.record(word, name, count);
            self.inner.enqueue(word.to_owned())?;
        }
        self.refresh()?;
        Ok(true)
    }

    fn search_documents(&self, word: &str) -> Result<DocumentCounts> {
        if word.is_empty() {
            return Err(Error::empty_argument("query word"));
        }

        let snapshot = self.inner.published.load();
        let query = word.to_lowercase();
        let mut merged = DocumentCounts::default();
        for keyword in snapshot.matched_keywords(&query) {
            if let Some(documents) = self.inner.postings.get(keyword) {
                for doc in documents.iter() {
                    *merged.entry(doc.key().clone()).or_insert(0) +=
                        doc.value().load(Ordering::Relaxed);
                }
            }
        }
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

        let lowered = prefix.to_lowercase();
        let prefixes = self.inner.prefixes.read();
        prefixes
            .range::<str, _>((Bound::Included(lowered.as_str()), Bound::Unbounded))
            .take_while(|word| word.starts_with(lowered.as_str()))
            .take(limit)
            .cloned()
            .collect()
    }

    fn size(&self) -> usize {
        self.inner.postings.len()
    }

    fn indexed_words(&self) -> usize {
        self.inner.postings.len()
    }
}
