//! Integration tests for configuration loading
//!
//! Tests that verify config loading from files and environment variables.

use jz::config::AppConfig;
use serial_test::serial;

#[test]
#[serial]
fn test_default_file_loads() {
    std::env::remove_var("JZ_PHYSICS__UNIT_METER");
    let config = AppConfig::load().unwrap();
    assert_eq!(config.physics.max_sub_steps, 15);
    assert_eq!(config.simulation.scene, "stack");
}

#[test]
#[serial]
fn test_env_override() {
    std::env::set_var("JZ_PHYSICS__UNIT_METER", "100");
    let config = AppConfig::load().unwrap();
    std::env::remove_var("JZ_PHYSICS__UNIT_METER");
    assert_eq!(config.physics.unit_meter, 100.0);
    assert_eq!(config.physics.to_physics_config().unit_meter, 100.0);
}

#[test]
#[serial]
fn test_missing_directory_uses_defaults() {
    let config = AppConfig::load_from("does/not/exist").unwrap();
    assert_eq!(config.physics.gravity, [0.0, -9.8, 0.0]);
    assert_eq!(config.debug.log_level, "info");
}

#[test]
#[serial]
fn test_bad_value_is_an_error() {
    std::env::set_var("JZ_PHYSICS__MAX_SUB_STEPS", "lots");
    let result = AppConfig::load();
    std::env::remove_var("JZ_PHYSICS__MAX_SUB_STEPS");
    let err = result.unwrap_err();
    assert!(err.to_string().starts_with("Configuration error"));
}
