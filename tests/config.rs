//! Configuration system tests
//!
//! Tests for config paths and input config loading/saving.

use input_base::config_paths;
use input_base::input::{DispatchRoute, InputSystem};
use input_base::{InputConfig, InputError};

// ========================================================================
// Config Paths Tests
// ========================================================================

#[test]
fn test_config_dir_contains_app_dir() {
    if let Some(dir) = config_paths::config_dir() {
        assert!(dir.to_string_lossy().contains("input-base"));
    }
}

#[test]
fn test_config_file_is_yaml_in_config_dir() {
    if let (Some(dir), Some(file)) = (config_paths::config_dir(), config_paths::config_file()) {
        assert_eq!(file.parent(), Some(dir.as_path()));
        assert_eq!(file.file_name().unwrap(), "input.yaml");
    }
}

#[test]
fn test_logs_dir_under_config_dir() {
    if let (Some(dir), Some(logs)) = (config_paths::config_dir(), config_paths::logs_dir()) {
        assert!(logs.starts_with(&dir));
        assert!(logs.ends_with("logs"));
    }
}

// ========================================================================
// InputConfig Tests
// ========================================================================

#[test]
fn test_save_then_load_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("input.yaml");

    let config = InputConfig {
        route: DispatchRoute::RawHook,
        full_trace: true,
        log_events: false,
    };
    config.save_to(&path).unwrap();

    assert_eq!(InputConfig::load_from(&path).unwrap(), config);
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yaml");

    match InputConfig::load_from(&path) {
        Err(InputError::ConfigIo { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected ConfigIo, got {:?}", other),
    }
}

#[test]
fn test_load_malformed_file_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.yaml");
    std::fs::write(&path, "full_trace: [not, a, bool]\n").unwrap();

    assert!(matches!(
        InputConfig::load_from(&path),
        Err(InputError::ConfigParse(_))
    ));
}

#[test]
fn test_config_flags_reach_system() {
    let config = InputConfig::from_yaml("log_events: true\nroute: tick_diff\n").unwrap();
    let system = InputSystem::with_config(&config).unwrap();
    assert_eq!(system.route(), DispatchRoute::TickDiff);
    assert!(system.dispatcher().logs_events());
    assert!(!system.dispatcher().full_trace());

    let config = InputConfig::from_yaml("full_trace: true\n").unwrap();
    let system = InputSystem::with_config(&config).unwrap();
    assert!(system.dispatcher().full_trace());
    assert!(!system.dispatcher().logs_events());
}
