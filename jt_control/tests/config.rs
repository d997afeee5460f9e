use jt_control::{EngineConfig, EngineError};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

fn scratch_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("jt_control_{}_{name}", std::process::id()));
    fs::write(&path, contents).expect("write scratch config");
    path
}

#[test]
fn missing_file_yields_defaults() {
    let path = std::env::temp_dir().join("jt_control_does_not_exist.json");
    let config = EngineConfig::load(&path).expect("defaults");
    assert_eq!(config.preferred_device_marker, "JT-4000M");
    assert_eq!((config.toggle_on_weight, config.toggle_choices), (1, 3));
    assert_eq!(config.bridge_addr, "127.0.0.1:9001");
    assert_eq!(config.device_poll_interval(), Duration::from_millis(500));
}

#[test]
fn partial_file_keeps_other_defaults() {
    let path = scratch_file(
        "partial.json",
        r#"{ "preferred_device_marker": "JT-4000", "toggle_choices": 4 }"#,
    );
    let config = EngineConfig::load(&path).expect("partial config");
    let _ = fs::remove_file(&path);

    assert_eq!(config.preferred_device_marker, "JT-4000");
    assert_eq!(config.toggle_choices, 4);
    assert_eq!(config.toggle_on_weight, 1);
    assert_eq!(config.client_name, "jt-control");
    assert_eq!(config.tick_interval(), Duration::from_millis(16));
}

#[test]
fn impossible_toggle_odds_are_rejected() {
    let path = scratch_file("odds.json", r#"{ "toggle_on_weight": 5, "toggle_choices": 3 }"#);
    let result = EngineConfig::load(&path);
    let _ = fs::remove_file(&path);
    assert!(matches!(result, Err(EngineError::Config(_))));

    let zero = EngineConfig {
        toggle_choices: 0,
        ..EngineConfig::default()
    };
    assert!(zero.validate().is_err());
}

#[test]
fn malformed_json_is_a_config_error() {
    let path = scratch_file("broken.json", "{ toggle_choices: ");
    let result = EngineConfig::load(&path);
    let _ = fs::remove_file(&path);
    assert!(matches!(result, Err(EngineError::Config(_))));
}
