use crate::{
    error::{CliError, CliResult},
    logging,
};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use sidecar_config::Config;
use sidecar_core::TracingLogSink;
use sidecar_supervisor::{
    CommandLauncher, ConfigSettingsProvider, ProcessLauncher, ProcessSupervisor, ServerState,
    ServerStatus, SetupGuidance, SupervisorError, SupervisorTiming, TcpHealthProbe, ToolVersion,
};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{error, info};

/// Result of `sidecar check`.
#[derive(Debug)]
pub(crate) struct CheckReport {
    pub(crate) program: String,
    /// Trimmed output of the version command
    pub(crate) output: String,
    pub(crate) version: Option<ToolVersion>,
    pub(crate) minimum: ToolVersion,
}

impl CheckReport {
    /// `None` when the output holds no recognisable version.
    pub(crate) fn meets_minimum(&self) -> Option<bool> {
        self.version.map(|version| version >= self.minimum)
    }

    pub(crate) fn print(&self) {
        println!("{}: {}", self.program, self.output);
        match (self.version, self.meets_minimum()) {
            (Some(version), Some(true)) => {
                println!("Version {version} meets the minimum {}", self.minimum)
            }
            (Some(version), _) => println!(
                "Version {version} is below the minimum supported version {}; it may not work correctly",
                self.minimum
            ),
            (None, _) => println!(
                "Could not determine the version; the minimum supported version is {}",
                self.minimum
            ),
        }
    }
}

/// Start the server and supervise it until SIGINT/SIGTERM.
pub(crate) async fn run(config_dir: Option<&Path>, json: bool) -> CliResult<()> {
    let (config_dir, config) = load_config(config_dir)?;
    logging::setup_logging(&config_dir, &config.logging)?;

    info!("Starting sidecar v{}", env!("CARGO_PKG_VERSION"));
    info!("Config directory: {}", config_dir.display());
    config.log_summary();

    let supervisor = build_supervisor(&config_dir, &config)?;
    let status = match supervisor.ensure_started().await {
        Ok(status) => status,
        Err(e) => {
            supervisor.dispose().await;
            return Err(e.into());
        }
    };
    print_status(&status, json)?;

    let watcher = tokio::spawn(report_state_changes(supervisor.subscribe(), json));

    let received = wait_for_shutdown_signal().await;
    watcher.abort();
    match &received {
        Ok(signal) => info!("Received {signal}, shutting down..."),
        Err(e) => error!("Shutting down: {e}"),
    }

    supervisor.dispose().await;
    info!("Sidecar stopped");
    received.map(|_| ())
}

/// Run the version command only.
pub(crate) async fn check(config_dir: Option<&Path>) -> CliResult<CheckReport> {
    let (_, config) = load_config(config_dir)?;
    let minimum: ToolVersion = config.server.min_version.parse()?;
    let launcher = CommandLauncher::from(&config.server);

    let limit = Duration::from_secs(config.supervisor.version_timeout_secs);
    let detected = match timeout(limit, launcher.detect_version()).await {
        Ok(result) => result,
        Err(_) => Err(SupervisorError::command_failed(format!(
            "version check timed out after {}s",
            limit.as_secs()
        ))),
    };

    let output = match detected {
        Ok(output) => output,
        Err(e) => {
            let reason = e.root_cause().to_string();
            print_guidance(&SetupGuidance::tool_missing(&reason));
            return Err(SupervisorError::tool_missing(reason).into());
        }
    };

    Ok(CheckReport {
        program: launcher.program().to_string(),
        version: ToolVersion::extract(&output),
        output: output.trim().to_string(),
        minimum,
    })
}

pub(crate) fn show_config(config_dir: Option<&Path>) -> CliResult<()> {
    let (config_dir, config) = load_config(config_dir)?;
    logging::setup_console_logging(&config.logging)?;

    println!("Config directory: {}", config_dir.display());
    println!(
        "Log file: {}",
        logging::current_log_path(&config_dir, &config.logging).display()
    );
    config.log_summary();
    Ok(())
}

/// Explicit directory > SIDECAR_CONFIG_DIR > ./.sidecar
pub(crate) fn load_config(config_dir: Option<&Path>) -> CliResult<(PathBuf, Config)> {
    let config_dir = match config_dir {
        Some(dir) => dir.to_path_buf(),
        None => Config::config_dir()?,
    };

    let config = Config::load_from(&config_dir)?;
    config.validate()?;

    Ok((config_dir, config))
}

pub(crate) fn build_supervisor(config_dir: &Path, config: &Config) -> CliResult<ProcessSupervisor> {
    let minimum: ToolVersion = config.server.min_version.parse()?;
    let launcher = Arc::new(CommandLauncher::from(&config.server));
    let settings = Arc::new(ConfigSettingsProvider::with_dir(config_dir.to_path_buf()));

    Ok(ProcessSupervisor::builder(launcher, settings)
        .probe(Arc::new(TcpHealthProbe::default()))
        .log_sink(Arc::new(TracingLogSink))
        .timing(SupervisorTiming::from(&config.supervisor))
        .min_version(minimum)
        .build())
}

pub(crate) fn render_status(status: &ServerStatus, json: bool) -> CliResult<String> {
    if json {
        return serde_json::to_string(status).map_err(|e| CliError::output(e.to_string()));
    }

    let mut line = format!("MCP server {}", status.state);
    if let (Some(pid), Some(port)) = (status.pid, status.port) {
        line.push_str(&format!(" (pid {pid}, port {port})"));
    }
    if let Some(error) = &status.error {
        line.push_str(&format!(": {}", error.message));
    }
    Ok(line)
}

fn print_status(status: &ServerStatus, json: bool) -> CliResult<()> {
    println!("{}", render_status(status, json)?);
    Ok(())
}

fn print_guidance(guidance: &SetupGuidance) {
    eprintln!("{}", guidance.message);
    for action in &guidance.actions {
        match action.url() {
            Some(url) => eprintln!("  {}: {url}", action.label()),
            None => eprintln!("  {}", action.label()),
        }
    }
}

async fn report_state_changes(mut status: watch::Receiver<ServerStatus>, json: bool) {
    let mut last = status.borrow().state;
    while status.changed().await.is_ok() {
        let current = status.borrow_and_update().clone();
        if current.state == last {
            continue;
        }
        last = current.state;

        if let Err(e) = print_status(&current, json) {
            error!("{e}");
        }
        if last == ServerState::Error {
            error!("MCP server is in an error state; waiting for shutdown");
        }
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> CliResult<String> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals =
        Signals::new([SIGINT, SIGTERM]).map_err(|e| CliError::signal(e.to_string()))?;

    let received = tokio::task::spawn_blocking(move || signals.forever().next())
        .await
        .map_err(|e| CliError::signal(e.to_string()))?;

    match received {
        Some(signal) => Ok(format!("signal {signal}")),
        None => Err(CliError::signal("signal stream closed")),
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> CliResult<String> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| CliError::signal(e.to_string()))?;
    Ok(String::from("Ctrl+C"))
}
