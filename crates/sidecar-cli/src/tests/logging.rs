use crate::logging::{current_log_path, log_dir};

use std::path::Path;

use sidecar_config::LoggingConfig;

#[test]
fn given_logging_config_when_resolving_dir_then_relative_to_config_dir() {
    // Given
    let logging = LoggingConfig::default();

    // When
    let dir = log_dir(Path::new("/tmp/sidecar"), &logging);

    // Then
    assert_eq!(dir, Path::new("/tmp/sidecar").join(&logging.dir));
}

#[test]
fn given_file_prefix_when_resolving_current_log_then_dated_file() {
    // Given
    let logging = LoggingConfig {
        file_prefix: "sidecar-test".to_string(),
        ..LoggingConfig::default()
    };

    // When
    let path = current_log_path(Path::new("/tmp/sidecar"), &logging);

    // Then
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    assert_eq!(name, format!("sidecar-test.{today}.log"));
}
