//! Tests for config module

#[cfg(test)]
mod tests {
    use crate::config::*;

    // ========================================================================
    // Defaults
    // ========================================================================

    #[test]
    fn test_config_default_values() {
        // Arrange & Act
        let config = TierConfig::default();

        // Assert
        assert_eq!(config.topology.node_fanout, 10);
        assert_eq!(config.topology.shard_fanout, 10);
        assert_eq!(config.topology.leaf_capacity, 100);
        assert!(config.topology.shard_capacity.is_none());
        assert_eq!(config.search.default_suggest_limit, 10);
        assert_eq!(config.maintainer.rebuild, RebuildMode::Inline);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(TierConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rebuild_mode_serialization() {
        // Arrange
        let mode = RebuildMode::Deferred;

        // Act
        let json = serde_json::to_string(&mode).expect("serialize");
        let back: RebuildMode = serde_json::from_str(&json).expect("deserialize");

        // Assert
        assert_eq!(json, "\"deferred\"");
        assert_eq!(back, mode);
    }

    // ========================================================================
    // TOML parsing
    // ========================================================================

    #[test]
    fn test_from_toml_partial_override() {
        // Arrange
        let toml = r#"
            [topology]
            leaf_capacity = 25
            shard_capacity = 4

            [maintainer]
            rebuild = "deferred"
            workers = 2
        "#;

        // Act
        let config = TierConfig::from_toml(toml).expect("parse");

        // Assert
        assert_eq!(config.topology.leaf_capacity, 25);
        assert_eq!(config.topology.shard_capacity, Some(4));
        assert_eq!(config.topology.node_fanout, 10);
        assert_eq!(config.maintainer.rebuild, RebuildMode::Deferred);
        assert_eq!(config.maintainer.workers, 2);
    }

    #[test]
    fn test_from_toml_rejects_garbage() {
        let result = TierConfig::from_toml("[topology]\nleaf_capacity = \"many\"");

        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_toml_roundtrip_keeps_topology() {
        let mut config = TierConfig::default();
        config.topology.shard_fanout = 3;

        let text = config.to_toml().expect("serialize");
        let back = TierConfig::from_toml(&text).expect("parse");

        assert_eq!(back.topology.shard_fanout, 3);
    }

    #[test]
    fn test_load_from_path_reads_file() {
        // Arrange
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tiersearch.toml");
        std::fs::write(&path, "[search]\ndefault_suggest_limit = 7\n").expect("write");

        // Act
        let config = TierConfig::load_from_path(&path).expect("load");

        // Assert
        assert_eq!(config.search.default_suggest_limit, 7);
    }

    #[test]
    fn test_load_from_missing_path_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");

        let config = TierConfig::load_from_path(dir.path().join("absent.toml")).expect("load");

        assert_eq!(config.topology.leaf_capacity, 100);
    }

    // ========================================================================
    // Validation
    // ========================================================================

    #[test]
    fn test_validate_rejects_zero_fanout() {
        let mut config = TierConfig::default();
        config.topology.shard_fanout = 0;

        let err = config.validate().expect_err("zero fanout must fail");

        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "topology.shard_fanout"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_rejects_zero_shard_capacity() {
        let mut config = TierConfig::default();
        config.topology.shard_capacity = Some(0);

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_log_level() {
        let mut config = TierConfig::default();
        config.logging.level = "loud".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_effective_threads() {
        assert_eq!(effective_threads(3), 3);
        assert!(effective_threads(0) >= 1);
    }
}
