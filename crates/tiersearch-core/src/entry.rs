//! The capability set shared by every node of the shard tree.
//!
//! Leaf indexes and cluster engines both implement [`SearchEntry`], so an
//! engine can wrap leaves or other engines and nesting is plain composition.

use rustc_hash::FxHashMap;

use crate::cancel::CancellationToken;
use crate::error::Result;

/// Suggestion limit used by [`SearchEntry::suggest_default`].
pub const DEFAULT_SUGGEST_LIMIT: usize = 10;

/// Document name -> number of occurrences of the queried word(s).
pub type DocumentCounts = FxHashMap<String, u64>;

/// Operations every shard-tree node supports.
pub trait SearchEntry: Send + Sync {
    /// Indexes `text` under the document `name`.
    ///
    /// Repeated calls with the same name accumulate counts.
    ///
    /// # Errors
    ///
    /// Cluster engines return [`Error::InvalidArgument`](crate::Error::InvalidArgument)
    /// for an empty name.
    fn add_document(&self, name: &str, text: &str) -> Result<bool>;

    /// Returns the documents containing indexed keywords matched by `word`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`](crate::Error::InvalidArgument) for an
    /// empty word.
    fn search_documents(&self, word: &str) -> Result<DocumentCounts>;

    /// Up to `limit` indexed words starting with `prefix`, stopping early once
    /// `cancel` fires.
    ///
    /// Engines merge child lists in child order (active slots, then frozen
    /// children), so repeated calls over unchanged state agree.
    fn suggest_with_cancel(
        &self,
        prefix: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Vec<String>;

    /// Up to `limit` indexed words starting with `prefix`.
    fn suggest(&self, prefix: &str, limit: usize) -> Vec<String> {
        self.suggest_with_cancel(prefix, limit, &CancellationToken::never())
    }

    /// [`suggest`](Self::suggest) with [`DEFAULT_SUGGEST_LIMIT`].
    fn suggest_default(&self, prefix: &str) -> Vec<String> {
        self.suggest(prefix, DEFAULT_SUGGEST_LIMIT)
    }

    /// Fullness signal read by the parent engine: distinct words for a leaf,
    /// active children for an engine.
    fn size(&self) -> usize;

    /// Distinct words indexed in this subtree, frozen children included.
    fn indexed_words(&self) -> usize;
}
