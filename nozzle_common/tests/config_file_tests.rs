//! Shipped configuration file tests.

use nozzle_common::config::{ConfigError, ConfigLoader, LogLevel, NozzleConfig};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn shipped_config() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("config")
        .join("nozzle.toml")
}

#[test]
fn test_shipped_config_matches_defaults() {
    let loaded = NozzleConfig::load_or_default(Some(&shipped_config())).unwrap();
    let defaults = NozzleConfig::default();
    assert_eq!(loaded.actuator, defaults.actuator);
    assert_eq!(loaded.tracking.state_segment, defaults.tracking.state_segment);
    assert_eq!(loaded.tracking.signal_segment, defaults.tracking.signal_segment);
    assert_eq!(loaded.shared.log_level, LogLevel::Info);
}

#[test]
fn test_same_segment_twice_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nozzle.toml");
    fs::write(
        &path,
        r#"
[tracking]
state_segment = "TrackingState"
signal_segment = "/TrackingState"
"#,
    )
    .unwrap();

    // Parses, but fails validation.
    assert!(NozzleConfig::load(&path).is_ok());
    assert!(matches!(
        NozzleConfig::load_or_default(Some(&path)),
        Err(ConfigError::ValidationError(_))
    ));
}

#[test]
fn test_bad_syntax_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nozzle.toml");
    fs::write(&path, "[actuator\ndriver = ").unwrap();
    assert!(matches!(
        NozzleConfig::load_or_default(Some(&path)),
        Err(ConfigError::ParseError(_))
    ));
}
