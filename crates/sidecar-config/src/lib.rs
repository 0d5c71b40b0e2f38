mod config;
mod error;
mod log_level;
mod logging_config;
mod server_config;
mod session_config;
mod supervisor_config;

pub use config::Config;
pub use error::{ConfigError, ConfigErrorResult};
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use server_config::ServerConfig;
pub use session_config::SessionConfig;
pub use supervisor_config::SupervisorConfig;

#[cfg(test)]
mod tests;

const CONFIG_DIR_ENV: &str = "SIDECAR_CONFIG_DIR";
const DEFAULT_CONFIG_DIRNAME: &str = ".sidecar";
const CONFIG_FILENAME: &str = "config.toml";

const DEFAULT_PROGRAM: &str = "reasoning-server";
const DEFAULT_MIN_VERSION: &str = "0.1.0";
const DEFAULT_PORT: u16 = 8765;
const DEFAULT_TIMEOUT_MS: u64 = 30000;
const DEFAULT_LOG_LEVEL_STRING: &str = "info";
const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;
const DEFAULT_LOG_DIRECTORY: &str = "logs";
const DEFAULT_LOG_FILE_PREFIX: &str = "sidecar";

const MIN_PORT: u16 = 1024;
