//! End-to-end scenarios across the full node → shard → leaf tree.

use std::sync::Arc;
use std::thread;

use tempfile::tempdir;
use tiersearch_core::{
    CancellationToken, LeafIndex, LeafSnapshot, RebuildMode, SearchEntry, SearchTree, TierConfig,
};

fn corpus() -> Vec<(String, String)> {
    (0..200)
        .map(|i| {
            let topic = ["rust", "search", "index", "shard"][i % 4];
            (format!("doc{i:03}"), format!("{topic} common t{i:03} {topic}"))
        })
        .collect()
}

#[test]
fn test_config_file_drives_tree_shape() {
    // Arrange
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("tiersearch.toml");
    std::fs::write(
        &path,
        r#"
            [topology]
            node_fanout = 3
            shard_fanout = 4
            leaf_capacity = 8

            [search]
            default_suggest_limit = 5
            fanout_threads = 2
        "#,
    )
    .expect("write config");
    let config = TierConfig::load_from_path(&path).expect("load");

    // Act
    let tree = SearchTree::build(&config).expect("build");
    for (name, text) in corpus() {
        tree.add_document(&name, &text).expect("add");
    }

    // Assert
    assert_eq!(tree.size(), 3);
    assert_eq!(tree.node().settings().fanout, 3);
    assert_eq!(tree.search_documents("common").expect("search").len(), 200);
    assert_eq!(tree.autocomplete("t1").len(), 5);
}

#[test]
fn test_inline_and_deferred_trees_agree() {
    // Arrange
    let inline = SearchTree::build(&TierConfig::default()).expect("inline");
    let mut deferred_config = TierConfig::default();
    deferred_config.maintainer.rebuild = RebuildMode::Deferred;
    deferred_config.maintainer.workers = 2;
    let deferred = SearchTree::build(&deferred_config).expect("deferred");

    // Act
    for (name, text) in corpus() {
        inline.add_document(&name, &text).expect("add");
        deferred.add_document(&name, &text).expect("add");
    }
    deferred.sync();

    // Assert
    for word in ["rust", "search", "index", "shard", "t042"] {
        assert_eq!(
            inline.search_documents(word).expect("search"),
            deferred.search_documents(word).expect("search"),
            "results for '{word}' must match"
        );
    }
    let mut a = inline.suggest("t0", 100);
    let mut b = deferred.suggest("t0", 100);
    a.sort();
    b.sort();
    assert_eq!(a, b);
    assert_eq!(a.len(), 100);
    deferred.shutdown();
}

#[test]
fn test_topic_counts_survive_freezing() {
    let mut config = TierConfig::default();
    config.topology.leaf_capacity = 4;
    let tree = SearchTree::build(&config).expect("build");

    for (name, text) in corpus() {
        tree.add_document(&name, &text).expect("add");
    }

    assert_eq!(tree.frozen_count(), 0, "node level never freezes by default");
    let hits = tree.search_documents("rust").expect("search");
    assert_eq!(hits.len(), 50);
    assert!(hits.values().all(|&count| count == 2));
}

#[test]
fn test_parallel_clients_on_shared_tree() {
    // Arrange
    let tree = Arc::new(SearchTree::build(&TierConfig::default()).expect("build"));
    let writers = 6;
    let docs_per_writer = 40;

    // Act
    let handles: Vec<_> = (0..writers)
        .map(|w| {
            let tree = Arc::clone(&tree);
            thread::spawn(move || {
                for i in 0..docs_per_writer {
                    tree.add_document(&format!("w{w}-d{i}"), "parallel payload")
                        .expect("add");
                    let _ = tree.suggest("pa", 3);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("client panicked");
    }

    // Assert
    let hits = tree.search_documents("payload").expect("search");
    assert_eq!(hits.len(), writers * docs_per_writer);
    let mut suggestions = tree.suggest("pa", 10);
    suggestions.sort();
    assert_eq!(suggestions, vec!["parallel", "payload"]);
}

#[test]
fn test_caller_cancellation_short_circuits_tree() {
    let tree = SearchTree::build(&TierConfig::default()).expect("build");
    tree.add_document("doc", "cancellable").expect("add");
    let token = CancellationToken::new();

    token.cancel();

    assert!(tree.suggest_with_cancel("can", 10, &token).is_empty());
    assert_eq!(tree.suggest("can", 10), vec!["cancellable"]);
}

#[test]
fn test_leaf_snapshot_persists_through_file() {
    // Arrange
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("leaf.json");
    let leaf = LeafIndex::new();
    leaf.add_document("doc1", "persist me persist").expect("add");

    // Act
    let json = serde_json::to_vec(&leaf.export()).expect("serialize");
    std::fs::write(&path, json).expect("write");
    let bytes = std::fs::read(&path).expect("read");
    let snapshot: LeafSnapshot = serde_json::from_slice(&bytes).expect("deserialize");
    let restored = LeafIndex::restore(snapshot, None).expect("restore");

    // Assert
    assert_eq!(restored.size(), 2);
    assert_eq!(
        restored.search_documents("persist").expect("search").get("doc1"),
        Some(&2)
    );
}
