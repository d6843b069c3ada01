//! Unused config keys are reported as warnings by default and become an
//! error under the strict policy.

use fdx_config::{load_layered_yaml_from_strings, report_unused_keys, UnusedKeyPolicy};

const TYPO_YAML: &str = r#"
harvest:
  safety_week: 3
  start_date: "2025-01-01"
paths:
  report_csv: "out.csv"
"#;

#[test]
fn typo_key_is_reported_under_warn() {
    let loaded = load_layered_yaml_from_strings(&[TYPO_YAML]).unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn).unwrap();
    assert_eq!(report.unused_leaf_pointers, vec!["/harvest/safety_week".to_string()]);
}

#[test]
fn typo_key_fails_under_fail_policy() {
    let loaded = load_layered_yaml_from_strings(&[TYPO_YAML]).unwrap();
    let err = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap_err();
    assert!(err.to_string().contains("CONFIG_UNUSED_KEYS"));
}

#[test]
fn shipped_base_config_is_fully_consumed() {
    let base = include_str!("../../../config/base.yaml");
    let loaded = load_layered_yaml_from_strings(&[base]).unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap();
    assert!(report.is_clean());

    let cfg = fdx_config::HarvestConfig::from_config_json(&loaded.config_json).unwrap();
    assert_eq!(cfg.safety_weeks, 2);
}
