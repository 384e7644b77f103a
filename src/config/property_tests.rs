//! Property-based tests for configuration module
//!
//! These tests use proptest to generate random configurations and verify
//! validation boundaries and serialization round-trips.

use super::*;
use proptest::prelude::*;

prop_compose! {
    fn valid_stacking_config()(
        layers in 1usize..=MAX_LAYERS,
        mode in prop_oneof![Just(StackingMode::Eager), Just(StackingMode::Deferred)],
    ) -> StackingConfig {
        StackingConfig { layers, mode }
    }
}

prop_compose! {
    fn valid_logging_config()(
        index in 0usize..LoggingConfig::LEVELS.len(),
        upper in any::<bool>(),
    ) -> LoggingConfig {
        let level = LoggingConfig::LEVELS[index];
        LoggingConfig {
            level: if upper { level.to_ascii_uppercase() } else { level.to_string() },
        }
    }
}

prop_compose! {
    fn valid_config()(
        stacking in valid_stacking_config(),
        logging in valid_logging_config(),
    ) -> StackConfig {
        StackConfig { stacking, logging }
    }
}

proptest! {
    #[test]
    fn prop_valid_configs_validate(config in valid_config()) {
        prop_assert!(config.validate().is_ok());
    }

    #[test]
    fn prop_toml_roundtrip(config in valid_config()) {
        let serialized = toml::to_string(&config).unwrap();
        let parsed: StackConfig = toml::from_str(&serialized).unwrap();
        prop_assert_eq!(parsed, config);
    }

    #[test]
    fn prop_oversized_layer_counts_rejected(layers in (MAX_LAYERS + 1)..10_000usize) {
        let mut config = StackConfig::default();
        config.stacking.layers = layers;
        prop_assert!(config.validate().is_err());
    }

    #[test]
    fn prop_unknown_levels_rejected(level in "[a-z]{1,12}") {
        prop_assume!(!LoggingConfig::LEVELS.contains(&level.as_str()));
        let mut config = StackConfig::default();
        config.logging.level = level;
        prop_assert!(config.validate().is_err());
    }
}
