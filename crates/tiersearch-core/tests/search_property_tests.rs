//! Property-based tests for counting and suggestion invariants.

use std::collections::HashMap;

use proptest::prelude::*;
use tiersearch_core::{build_shard_engine, FanoutPool, LevelSettings, SearchEntry, ShardEngine};

fn engine(fanout: usize, capacity: usize) -> ShardEngine {
    let pool = FanoutPool::new("prop", 2).expect("pool");
    build_shard_engine(LevelSettings::new(fanout, capacity), pool, None)
}

/// Fixed-length words over a tiny alphabet: distinct words never contain
/// one another, so exact-match semantics reduce to equality.
fn word_strategy() -> impl Strategy<Value = String> {
    "[abc]{3}"
}

fn documents_strategy() -> impl Strategy<Value = Vec<(usize, Vec<String>)>> {
    proptest::collection::vec(
        (0usize..8, proptest::collection::vec(word_strategy(), 0..6)),
        1..30,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(40))]

    /// Property: every reported count equals the occurrences written.
    #[test]
    fn prop_counts_equal_occurrences(
        docs in documents_strategy(),
        fanout in 1usize..4,
        capacity in 1usize..6,
    ) {
        let engine = engine(fanout, capacity);
        let mut expected: HashMap<String, HashMap<String, u64>> = HashMap::new();

        for (doc, words) in &docs {
            let name = format!("doc{doc}");
            engine.add_document(&name, &words.join(" ")).expect("add");
            for word in words {
                *expected
                    .entry(word.clone())
                    .or_default()
                    .entry(name.clone())
                    .or_default() += 1;
            }
        }

        for (word, per_doc) in &expected {
            let found = engine.search_documents(word).expect("search");
            prop_assert_eq!(found.len(), per_doc.len());
            for (name, count) in per_doc {
                prop_assert_eq!(found.get(name), Some(count));
            }
        }
    }

    /// Property: suggestions are distinct, share the prefix and respect the limit.
    #[test]
    fn prop_suggest_bounded_and_prefixed(
        docs in documents_strategy(),
        prefix in "[abc]{1,2}",
        limit in 1usize..12,
    ) {
        let engine = engine(3, 4);
        let mut vocabulary = std::collections::BTreeSet::new();
        for (doc, words) in &docs {
            engine.add_document(&format!("doc{doc}"), &words.join(" ")).expect("add");
            vocabulary.extend(words.iter().cloned());
        }

        let suggestions = engine.suggest(&prefix, limit);

        let matching = vocabulary.iter().filter(|w| w.starts_with(&prefix)).count();
        prop_assert_eq!(suggestions.len(), matching.min(limit));
        let mut distinct = suggestions.clone();
        distinct.sort();
        distinct.dedup();
        prop_assert_eq!(distinct.len(), suggestions.len());
        for suggestion in &suggestions {
            prop_assert!(suggestion.starts_with(&prefix));
            prop_assert!(vocabulary.contains(suggestion));
        }
    }

    /// Property: re-adding a document accumulates, it never replaces.
    #[test]
    fn prop_repeated_adds_accumulate(times in 1u64..20, capacity in 1usize..4) {
        let engine = engine(2, capacity);

        for _ in 0..times {
            engine.add_document("same", "again").expect("add");
        }

        let found = engine.search_documents("again").expect("search");
        prop_assert_eq!(found.get("same"), Some(&times));
    }
}
