//! Tests for configuration types and validation.

use super::*;

#[test]
fn test_default_config_is_valid() {
    let config = ShardsmithConfig::default();
    assert!(config.validate().is_ok());

    assert_eq!(config.dedup.shingle_k, 7);
    assert_eq!(config.dedup.num_permutations, 128);
    assert!((config.dedup.threshold - 0.80).abs() < f64::EPSILON);
    assert!(config.quality.enabled);
    assert_eq!(config.quality.min_loc, 5);
    assert_eq!(config.quality.max_loc, 400);
}

#[test]
fn test_zero_shingle_k_rejected() {
    let mut config = ShardsmithConfig::default();
    config.dedup.shingle_k = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_zero_permutations_rejected() {
    let mut config = ShardsmithConfig::default();
    config.dedup.num_permutations = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_threshold_out_of_range_rejected() {
    let mut config = ShardsmithConfig::default();
    config.dedup.threshold = 1.5;
    assert!(config.validate().is_err());

    config.dedup.threshold = -0.2;
    assert!(config.validate().is_err());
}

#[test]
fn test_band_row_split_must_cover_signature() {
    let mut config = ShardsmithConfig::default();
    config.dedup.bands = Some(16);
    config.dedup.rows = Some(8);
    assert!(config.validate().is_ok());

    config.dedup.rows = Some(9);
    assert!(config.validate().is_err());
}

#[test]
fn test_band_row_split_must_be_paired() {
    let mut config = ShardsmithConfig::default();
    config.dedup.bands = Some(16);
    config.dedup.rows = None;
    assert!(config.validate().is_err());
}

#[test]
fn test_loc_bounds_must_be_ordered() {
    let mut config = ShardsmithConfig::default();
    config.quality.min_loc = 500;
    config.quality.max_loc = 400;
    assert!(config.validate().is_err());
}

#[test]
fn test_empty_synthetic_pattern_rejected() {
    let mut config = ShardsmithConfig::default();
    config.quality.synthetic_docstrings.patterns.push(String::new());
    assert!(config.validate().is_err());
}

#[test]
fn test_yaml_round_trip() {
    let config = ShardsmithConfig::default();
    let yaml = serde_yaml::to_string(&config).unwrap();
    let parsed: ShardsmithConfig = serde_yaml::from_str(&yaml).unwrap();

    assert_eq!(parsed.dedup.shingle_k, config.dedup.shingle_k);
    assert_eq!(parsed.dedup.num_permutations, config.dedup.num_permutations);
    assert_eq!(parsed.quality.max_loc, config.quality.max_loc);
    assert_eq!(
        parsed.quality.synthetic_docstrings.patterns,
        config.quality.synthetic_docstrings.patterns
    );
}

#[test]
fn test_partial_yaml_uses_defaults() {
    let yaml = "dedup:\n  threshold: 0.9\n";
    let config: ShardsmithConfig = serde_yaml::from_str(yaml).unwrap();

    assert!((config.dedup.threshold - 0.9).abs() < f64::EPSILON);
    assert_eq!(config.dedup.shingle_k, 7);
    assert_eq!(config.dedup.num_permutations, 128);
    assert!(config.quality.enabled);
    assert!(config.validate().is_ok());
}

#[test]
fn test_rule_table_is_versioned() {
    let rules = SyntheticDocstringRules::default();
    assert_eq!(rules.version, 1);
    assert!(!rules.patterns.is_empty());
}
