use crate::{ServerSettings, SupervisorError, SupervisorResult};

use std::path::PathBuf;

use sidecar_config::Config;

/// Source of [`ServerSettings`], consulted at the start of every launch.
pub trait SettingsProvider: Send + Sync {
    fn settings(&self) -> SupervisorResult<ServerSettings>;
}

/// Fixed settings.
impl SettingsProvider for ServerSettings {
    fn settings(&self) -> SupervisorResult<ServerSettings> {
        Ok(self.clone())
    }
}

/// Re-reads the sidecar config on every call so edits apply on the next start.
#[derive(Debug, Clone, Default)]
pub struct ConfigSettingsProvider {
    config_dir: Option<PathBuf>,
}

impl ConfigSettingsProvider {
    /// Use the default config directory resolution.
    pub fn new() -> Self {
        Self { config_dir: None }
    }

    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self {
            config_dir: Some(config_dir),
        }
    }
}

impl SettingsProvider for ConfigSettingsProvider {
    fn settings(&self) -> SupervisorResult<ServerSettings> {
        let config = match &self.config_dir {
            Some(dir) => Config::load_from(dir),
            None => Config::load(),
        }
        .map_err(SupervisorError::settings)?;

        config.server.validate().map_err(SupervisorError::settings)?;

        Ok(ServerSettings::from(&config.server))
    }
}
