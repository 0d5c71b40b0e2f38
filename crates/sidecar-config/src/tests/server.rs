use crate::Config;
use crate::tests::{EnvGuard, setup_config_dir};

use googletest::assert_that;
use googletest::prelude::{anything, err, ok};
use serial_test::serial;

// =========================================================================
// Validation Tests - Server
// =========================================================================

#[test]
#[serial]
fn given_privileged_port_when_validate_then_error() {
    // Given
    let (_temp, _guard) = setup_config_dir();
    let _port = EnvGuard::set("SIDECAR_SERVER_PORT", "80");

    // When
    let config = Config::load().unwrap();
    let result = config.validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
#[serial]
fn given_empty_program_when_validate_then_server_error() {
    // Given
    let (_temp, _guard) = setup_config_dir();
    let _program = EnvGuard::set("SIDECAR_SERVER_PROGRAM", "  ");

    // When
    let config = Config::load().unwrap();
    let result = config.validate();

    // Then
    let error = result.unwrap_err();
    assert_eq!(error.category(), Some("Server"));
}

#[test]
#[serial]
fn given_timeout_below_min_when_validate_then_error() {
    // Given
    let (_temp, _guard) = setup_config_dir();
    let _timeout = EnvGuard::set("SIDECAR_SERVER_TIMEOUT_MS", "10");

    // When
    let config = Config::load().unwrap();
    let result = config.validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
#[serial]
fn given_valid_server_overrides_when_validate_then_ok() {
    // Given
    let (_temp, _guard) = setup_config_dir();
    let _port = EnvGuard::set("SIDECAR_SERVER_PORT", "9001");
    let _timeout = EnvGuard::set("SIDECAR_SERVER_TIMEOUT_MS", "60000");
    let _level = EnvGuard::set("SIDECAR_SERVER_LOG_LEVEL", "trace");

    // When
    let config = Config::load().unwrap();
    let result = config.validate();

    // Then
    assert_that!(result, ok(anything()));
    assert_eq!(config.server.log_level.as_str(), "trace");
}
