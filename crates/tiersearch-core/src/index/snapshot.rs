//! Immutable structures handed out by a leaf index.
//!
//! [`MatchSnapshot`] is the published exact-match automaton readers load
//! atomically; [`LeafSnapshot`] is the plain postings dump an external
//! persistence layer can serialize.

use std::collections::BTreeMap;

use aho_corasick::{AhoCorasick, MatchKind};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Multi-keyword matcher over every incorporated word of a leaf.
///
/// Matching runs one pass over the query and reports each indexed keyword
/// that occurs anywhere inside it.
#[derive(Debug, Default)]
pub(crate) struct MatchSnapshot {
    automaton: Option<AhoCorasick>,
    keywords: Vec<String>,
}

impl MatchSnapshot {
    /// Snapshot that matches nothing.
    pub(crate) fn empty() -> Self {
        Self::default()
    }

    /// Builds an automaton over `keywords`.
    pub(crate) fn build(keywords: &[String]) -> Result<Self> {
        if keywords.is_empty() {
            return Ok(Self::empty());
        }
        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::Standard)
            .build(keywords)?;
        Ok(Self {
            automaton: Some(automaton),
            keywords: keywords.to_vec(),
        })
    }

    /// Number of keywords compiled into the automaton.
    pub(crate) fn len(&self) -> usize {
        self.keywords.len()
    }

    /// Distinct keywords occurring in `query`, in first-match order.
    pub(crate) fn matched_keywords(&self, query: &str) -> Vec<&str> {
        let Some(automaton) = &self.automaton else {
            return Vec::new();
        };
        let mut seen = FxHashSet::default();
        automaton
            .find_overlapping_iter(query)
            .filter(|m| seen.insert(m.pattern()))
            .map(|m| self.keywords[m.pattern().as_usize()].as_str())
            .collect()
    }
}

/// Every posting of one leaf: word -> document -> count.
///
/// Ordered maps keep the dump deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafSnapshot {
    /// Postings keyed by normalized word.
    pub postings: BTreeMap<String, BTreeMap<String, u64>>,
}

impl LeafSnapshot {
    /// Number of distinct words in the dump.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.postings.len()
    }
}
