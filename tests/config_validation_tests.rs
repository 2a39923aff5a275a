//! Config Validation Tests
//!
//! Typo detection and range validation for `monitor.toml`, exercised through
//! the public config API independently from the loops.

use std::io::Write;

use vibration_monitor::config::validation::{
    known_config_keys, suggest_correction, validate_ranges, validate_unknown_keys,
};
use vibration_monitor::config::{ConfigError, MonitorConfig};

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_sampling_section_warns_with_suggestion() {
    let toml_str = r#"
[sampling]
intervall_ms = 200
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert!(warnings[0].field.contains("intervall_ms"));
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("sampling.interval_ms")
    );
}

#[test]
fn unknown_section_is_reported() {
    let warnings = validate_unknown_keys(
        r#"
[wifi]
ssid = "plant-floor"
"#,
    );
    let fields: Vec<&str> = warnings.iter().map(|w| w.field.as_str()).collect();
    assert!(fields.contains(&"wifi"));
    assert!(fields.contains(&"wifi.ssid"));
}

#[test]
fn full_valid_config_produces_zero_warnings() {
    let toml_str = r#"
[sensor]
lock_timeout_ms = 10
gravity = 9.8

[sampling]
interval_ms = 250
publish_timeout_ms = 10

[analysis]
tick_interval_ms = 1000
fft_every_ticks = 2
runtime_every_ticks = 10
tick_wrap = 600
publish_timeout_ms = 100

[spectrum]
sample_count = 256
sample_rate_hz = 1000.0
bins_to_publish = 64

[classifier]
on_debounce_secs = 3
off_debounce_secs = 5
checkpoint_interval_secs = 300

[calibration]
duration_secs = 5
settle_ms = 500
poll_interval_ms = 100
threshold_multiplier = 2.0
threshold_offset = 0.5

[storage]
path = "./data/runtime.db"
namespace = "motor-monitor"
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);

    let config = MonitorConfig::from_toml_str(toml_str).expect("full config should load");
    assert_eq!(config.spectrum.sample_count, 256);
    assert_eq!(config.storage.namespace, "motor-monitor");
}

#[test]
fn every_known_key_is_accepted() {
    let known = known_config_keys();
    for key in &known {
        assert_eq!(
            suggest_correction(key, &known).as_deref(),
            Some(*key),
            "{} should be its own closest match",
            key
        );
    }
}

// ============================================================================
// Range Validation
// ============================================================================

#[test]
fn defaults_pass_range_validation() {
    assert!(validate_ranges(&MonitorConfig::default()).is_empty());
}

#[test]
fn non_power_of_two_window_is_rejected() {
    let err = MonitorConfig::from_toml_str(
        r#"
[spectrum]
sample_count = 300
"#,
    )
    .unwrap_err();
    match err {
        ConfigError::Validation(errors) => {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].contains("spectrum.sample_count"));
        }
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn all_violations_are_collected() {
    let mut config = MonitorConfig::default();
    config.sampling.interval_ms = 1_000;
    config.classifier.off_debounce_secs = 0;
    config.storage.namespace = "  ".to_string();

    let errors = validate_ranges(&config);
    assert_eq!(errors.len(), 3, "errors: {:?}", errors);
}

#[test]
fn tick_wrap_must_align_with_cadences() {
    let mut config = MonitorConfig::default();
    config.analysis.tick_wrap = 15;
    let errors = validate_ranges(&config);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("tick_wrap"));
}

// ============================================================================
// File Loading
// ============================================================================

#[test]
fn load_from_file_reads_partial_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[classifier]\ncheckpoint_interval_secs = 60").unwrap();

    let config = MonitorConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.classifier.checkpoint_interval_secs, 60);
    assert_eq!(config.classifier.on_debounce_secs, 3);
    assert_eq!(config.sampling.interval_ms, 250);
}

#[test]
fn parse_error_names_the_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[sampling\ninterval_ms = ").unwrap();

    let err = MonitorConfig::load_from_file(file.path()).unwrap_err();
    match &err {
        ConfigError::Parse(path, _) => assert_eq!(path, file.path()),
        other => panic!("expected parse error, got {other}"),
    }
    assert!(err.to_string().contains(&file.path().display().to_string()));
}

#[test]
fn sample_rate_without_a_capture_period_is_rejected() {
    let err = MonitorConfig::from_toml_str(
        r#"
[spectrum]
sample_rate_hz = 4000000.0
"#,
    )
    .unwrap_err();
    match err {
        ConfigError::Validation(errors) => {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].contains("spectrum.sample_rate_hz"));
        }
        other => panic!("expected validation error, got {other}"),
    }
}
