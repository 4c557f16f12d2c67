//! Aggregation of partial results coming back from a fan-out.

use rustc_hash::FxHashSet;

use crate::entry::DocumentCounts;

/// Adds every count in `from` onto `into`.
///
/// Documents present on both sides are summed, never overwritten.
pub fn merge_counts(into: &mut DocumentCounts, from: DocumentCounts) {
    if into.is_empty() {
        *into = from;
        return;
    }
    for (name, count) in from {
        *into.entry(name).or_insert(0) += count;
    }
}

/// Insertion-ordered, deduplicating accumulator bounded by a limit.
#[derive(Debug)]
pub struct SuggestionCollector {
    limit: usize,
    seen: FxHashSet<String>,
    ordered: Vec<String>,
}

impl SuggestionCollector {
    /// Creates a collector that keeps at most `limit` distinct suggestions.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            seen: FxHashSet::default(),
            ordered: Vec::with_capacity(limit.min(64)),
        }
    }

    /// Adds suggestions in order, skipping duplicates.
    ///
    /// Returns true once the limit is satisfied; anything past it is dropped.
    pub fn extend<I: IntoIterator<Item = String>>(&mut self, suggestions: I) -> bool {
        for suggestion in suggestions {
            if self.is_full() {
                break;
            }
            if self.seen.insert(suggestion.clone()) {
                self.ordered.push(suggestion);
            }
        }
        self.is_full()
    }

    /// True when `limit` distinct suggestions have been accumulated.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.ordered.len() >= self.limit
    }

    /// Number of distinct suggestions so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// True when nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Consumes the collector, returning suggestions in arrival order.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.ordered
    }
}

/// Merges per-child suggestion lists in child order, whatever order the
/// children finish in, so a fan-out over unchanged state is repeatable.
#[derive(Debug)]
pub struct OrderedSuggestions {
    finished: Vec<Option<Vec<String>>>,
    next: usize,
    collector: SuggestionCollector,
}

impl OrderedSuggestions {
    /// Creates a merge over `children` result lists bounded by `limit`.
    #[must_use]
    pub fn new(children: usize, limit: usize) -> Self {
        Self {
            finished: vec![None; children],
            next: 0,
            collector: SuggestionCollector::new(limit),
        }
    }

    /// Records the result of child `index` and folds in every consecutive
    /// finished child from the front.
    ///
    /// Returns true once the merged prefix holds `limit` suggestions; later
    /// children can no longer change the outcome.
    pub fn complete(&mut self, index: usize, suggestions: Vec<String>) -> bool {
        if let Some(slot) = self.finished.get_mut(index) {
            *slot = Some(suggestions);
        }
        while self.next < self.finished.len() && !self.collector.is_full() {
            let Some(found) = self.finished[self.next].take() else {
                break;
            };
            self.collector.extend(found);
            self.next += 1;
        }
        self.collector.is_full()
    }

    /// True once `limit` suggestions have been merged.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.collector.is_full()
    }

    /// Consumes the merge, returning suggestions in child order.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.collector.into_vec()
    }
}
