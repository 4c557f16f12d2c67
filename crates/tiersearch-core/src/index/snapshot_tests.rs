//! Tests for the exact-match snapshot and postings dump.

use super::snapshot::{LeafSnapshot, MatchSnapshot};

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| (*w).to_string()).collect()
}

#[test]
fn test_empty_snapshot_matches_nothing() {
    let snapshot = MatchSnapshot::empty();

    assert_eq!(snapshot.len(), 0);
    assert!(snapshot.matched_keywords("anything").is_empty());
}

#[test]
fn test_build_with_no_keywords_is_empty() {
    let snapshot = MatchSnapshot::build(&[]).expect("build");

    assert!(snapshot.matched_keywords("hello").is_empty());
}

#[test]
fn test_exact_keyword_matches() {
    let snapshot = MatchSnapshot::build(&words(&["spring", "boot"])).expect("build");

    assert_eq!(snapshot.matched_keywords("spring"), vec!["spring"]);
}

#[test]
fn test_keywords_inside_query_match() {
    // Arrange
    let snapshot = MatchSnapshot::build(&words(&["he", "hello", "world"])).expect("build");

    // Act
    let mut matched = snapshot.matched_keywords("hello");
    matched.sort_unstable();

    // Assert
    assert_eq!(matched, vec!["he", "hello"]);
}

#[test]
fn test_repeated_keyword_reported_once() {
    let snapshot = MatchSnapshot::build(&words(&["la"])).expect("build");

    assert_eq!(snapshot.matched_keywords("lalala"), vec!["la"]);
}

#[test]
fn test_matching_ignores_ascii_case() {
    let snapshot = MatchSnapshot::build(&words(&["rust"])).expect("build");

    assert_eq!(snapshot.matched_keywords("RUST"), vec!["rust"]);
}

#[test]
fn test_leaf_snapshot_serde() {
    // Arrange
    let mut snapshot = LeafSnapshot::default();
    snapshot
        .postings
        .entry("alpha".to_string())
        .or_default()
        .insert("doc1".to_string(), 3);

    // Act
    let json = serde_json::to_string(&snapshot).expect("serialize");
    let back: LeafSnapshot = serde_json::from_str(&json).expect("deserialize");

    // Assert
    assert_eq!(json, r#"{"postings":{"alpha":{"doc1":3}}}"#);
    assert_eq!(back, snapshot);
    assert_eq!(back.word_count(), 1);
}
