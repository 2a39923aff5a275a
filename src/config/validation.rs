//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks on the timing parameters.
//!
//! Unknown keys are only warned about, so a stale config keeps working.
//! Range violations are collected and returned as errors, because the
//! loops cannot honour their timing with impossible values.

use std::collections::HashSet;

use super::MonitorConfig;

/// A non-fatal config warning (typo, unknown section).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, ", did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Every valid dotted key path of `MonitorConfig`.
///
/// Kept by hand alongside monitor_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [sensor]
        "sensor",
        "sensor.lock_timeout_ms",
        "sensor.gravity",
        // [sampling]
        "sampling",
        "sampling.interval_ms",
        "sampling.publish_timeout_ms",
        // [analysis]
        "analysis",
        "analysis.tick_interval_ms",
        "analysis.fft_every_ticks",
        "analysis.runtime_every_ticks",
        "analysis.tick_wrap",
        "analysis.publish_timeout_ms",
        // [spectrum]
        "spectrum",
        "spectrum.sample_count",
        "spectrum.sample_rate_hz",
        "spectrum.bins_to_publish",
        // [classifier]
        "classifier",
        "classifier.on_debounce_secs",
        "classifier.off_debounce_secs",
        "classifier.checkpoint_interval_secs",
        // [calibration]
        "calibration",
        "calibration.duration_secs",
        "calibration.settle_ms",
        "calibration.poll_interval_ms",
        "calibration.threshold_multiplier",
        "calibration.threshold_offset",
        // [storage]
        "storage",
        "storage.path",
        "storage.namespace",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// A table `{ a = { b = 1, c = 2 } }` yields `["a", "a.b", "a.c"]`.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Closest known key within edit distance 3, if any.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (k, levenshtein(unknown, k)))
        .filter(|&(_, dist)| dist <= 3)
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown keys.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // serde reports the parse error
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

/// Check the timing and sizing constraints the loops rely on.
///
/// Returns every violation found, empty when the config is usable.
pub fn validate_ranges(config: &MonitorConfig) -> Vec<String> {
    let mut errors = Vec::new();

    if config.sensor.lock_timeout_ms == 0 {
        errors.push("sensor.lock_timeout_ms must be > 0".to_string());
    }
    if !config.sensor.gravity.is_finite() {
        errors.push(format!("sensor.gravity = {} must be finite", config.sensor.gravity));
    }

    let interval = config.sampling.interval_ms;
    if !(100..=250).contains(&interval) {
        errors.push(format!(
            "sampling.interval_ms = {interval} is outside the supported range (100-250 ms)"
        ));
    }

    let a = &config.analysis;
    if a.tick_interval_ms == 0 {
        errors.push("analysis.tick_interval_ms must be > 0".to_string());
    }
    if a.fft_every_ticks == 0 || a.runtime_every_ticks == 0 {
        errors.push(format!(
            "analysis.fft_every_ticks = {} and analysis.runtime_every_ticks = {} must both be > 0",
            a.fft_every_ticks, a.runtime_every_ticks
        ));
    } else if a.tick_wrap == 0
        || a.tick_wrap % a.fft_every_ticks != 0
        || a.tick_wrap % a.runtime_every_ticks != 0
    {
        errors.push(format!(
            "analysis.tick_wrap = {} must be a non-zero multiple of fft_every_ticks ({}) and runtime_every_ticks ({})",
            a.tick_wrap, a.fft_every_ticks, a.runtime_every_ticks
        ));
    }

    let s = &config.spectrum;
    if s.sample_count < 4 || !s.sample_count.is_power_of_two() {
        errors.push(format!(
            "spectrum.sample_count = {} must be a power of two >= 4",
            s.sample_count
        ));
    } else if s.bins_to_publish == 0 || s.bins_to_publish > s.sample_count / 2 - 1 {
        errors.push(format!(
            "spectrum.bins_to_publish = {} must be within 1..={}",
            s.bins_to_publish,
            s.sample_count / 2 - 1
        ));
    }
    if !(s.sample_rate_hz.is_finite() && s.sample_rate_hz > 0.0) {
        errors.push(format!(
            "spectrum.sample_rate_hz = {} must be > 0",
            s.sample_rate_hz
        ));
    } else if s.sampling_period().is_zero() {
        errors.push(format!(
            "spectrum.sample_rate_hz = {} gives a capture period below 1 µs",
            s.sample_rate_hz
        ));
    }

    let c = &config.classifier;
    if c.checkpoint_interval_secs == 0 {
        errors.push("classifier.checkpoint_interval_secs must be > 0".to_string());
    }
    if c.on_debounce_secs == 0 || c.off_debounce_secs == 0 {
        errors.push(format!(
            "classifier debounce windows (on = {}s, off = {}s) must be > 0",
            c.on_debounce_secs, c.off_debounce_secs
        ));
    }

    let cal = &config.calibration;
    if cal.settle_ms >= cal.duration_secs.saturating_mul(1000) {
        errors.push(format!(
            "calibration.settle_ms = {} leaves no measurement time within duration_secs = {}",
            cal.settle_ms, cal.duration_secs
        ));
    }
    if cal.poll_interval_ms == 0 {
        errors.push("calibration.poll_interval_ms must be > 0".to_string());
    }
    if !(cal.threshold_multiplier.is_finite() && cal.threshold_offset.is_finite()) {
        errors.push("calibration threshold parameters must be finite".to_string());
    }

    if config.storage.namespace.trim().is_empty() {
        errors.push("storage.namespace must not be empty".to_string());
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_basics() {
        assert_eq!(levenshtein("tick_wrap", "tick_wrap"), 0);
        assert_eq!(levenshtein("tick_wrp", "tick_wrap"), 1);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [spectrum]
            sample_count = 256
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"spectrum".to_string()));
        assert!(keys.contains(&"spectrum.sample_count".to_string()));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let warnings = validate_unknown_keys(
            r#"
[classifier]
of_debounce_secs = 5
"#,
        );
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("classifier.off_debounce_secs")
        );
    }

    #[test]
    fn test_valid_keys_produce_zero_warnings() {
        let warnings = validate_unknown_keys(
            r#"
[sampling]
interval_ms = 200

[storage]
namespace = "pump-3"
"#,
        );
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
    }

    #[test]
    fn test_garbage_has_no_suggestion() {
        let known = known_config_keys();
        assert!(suggest_correction("completely_unrelated_garbage_key_xyz", &known).is_none());
    }

    #[test]
    fn test_defaults_are_in_range() {
        let errors = validate_ranges(&MonitorConfig::default());
        assert!(errors.is_empty(), "defaults should validate: {:?}", errors);
    }

    #[test]
    fn test_sample_interval_out_of_range() {
        let mut config = MonitorConfig::default();
        config.sampling.interval_ms = 50;
        let errors = validate_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("sampling.interval_ms")));
    }

    #[test]
    fn test_tick_wrap_must_divide() {
        let mut config = MonitorConfig::default();
        config.analysis.tick_wrap = 605;
        let errors = validate_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("tick_wrap")));
    }

    #[test]
    fn test_sample_count_power_of_two() {
        let mut config = MonitorConfig::default();
        config.spectrum.sample_count = 200;
        let errors = validate_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("sample_count")));
    }

    #[test]
    fn test_bins_bounded_by_half_window() {
        let mut config = MonitorConfig::default();
        config.spectrum.bins_to_publish = 128;
        let errors = validate_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("bins_to_publish")));

        config.spectrum.bins_to_publish = 127;
        assert!(validate_ranges(&config).is_empty());
    }

    #[test]
    fn test_sample_rate_must_leave_a_capture_period() {
        let mut config = MonitorConfig::default();
        config.spectrum.sample_rate_hz = 4_000_000.0;
        let errors = validate_ranges(&config);
        assert_eq!(errors.len(), 1, "errors: {:?}", errors);
        assert!(errors[0].contains("sample_rate_hz"));

        // 1 MHz still rounds to a 1 µs grid
        config.spectrum.sample_rate_hz = 1_000_000.0;
        assert!(validate_ranges(&config).is_empty());
    }
}
