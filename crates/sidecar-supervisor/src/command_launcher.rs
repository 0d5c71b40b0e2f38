//! Real [`ProcessLauncher`] backed by `tokio::process`.

use crate::{
    PROCESS_EVENT_BUFFER, ProcessEvent, ProcessLauncher, ServerProcess, ServerSettings,
    SpawnedProcess, SupervisorError, SupervisorResult,
};

use std::process::Stdio;

use async_trait::async_trait;
use sidecar_config::ServerConfig;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info};

const PORT_PLACEHOLDER: &str = "{port}";
const TIMEOUT_PLACEHOLDER: &str = "{timeout_ms}";
const LOG_LEVEL_PLACEHOLDER: &str = "{log_level}";

const PORT_ENV: &str = "SIDECAR_SERVER_PORT";
const TIMEOUT_ENV: &str = "SIDECAR_SERVER_TIMEOUT_MS";
const LOG_LEVEL_ENV: &str = "SIDECAR_SERVER_LOG_LEVEL";

/// Launches the configured server program.
///
/// Arguments may contain `{port}`, `{timeout_ms}` and `{log_level}`; the same
/// values are exported as `SIDECAR_SERVER_*` environment variables.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    program: String,
    args: Vec<String>,
    version_args: Vec<String>,
}

impl CommandLauncher {
    pub fn new(program: impl Into<String>, args: Vec<String>, version_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            version_args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Server arguments with placeholders filled in.
    pub fn expand_args(&self, settings: &ServerSettings) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace(PORT_PLACEHOLDER, &settings.port.to_string())
                    .replace(TIMEOUT_PLACEHOLDER, &settings.timeout_ms.to_string())
                    .replace(LOG_LEVEL_PLACEHOLDER, &settings.log_level)
            })
            .collect()
    }
}

impl From<&ServerConfig> for CommandLauncher {
    fn from(config: &ServerConfig) -> Self {
        Self::new(
            config.program.clone(),
            config.args.clone(),
            config.version_args.clone(),
        )
    }
}

#[async_trait]
impl ProcessLauncher for CommandLauncher {
    async fn detect_version(&self) -> SupervisorResult<String> {
        let output = Command::new(&self.program)
            .args(&self.version_args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| SupervisorError::command_failed(format!("{}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SupervisorError::command_failed(format!(
                "{} {} exited with {}: {}",
                self.program,
                self.version_args.join(" "),
                output.status,
                stderr.trim()
            )));
        }

        // Some tools print their version on stderr.
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        if text.trim().is_empty() {
            text = String::from_utf8_lossy(&output.stderr).into_owned();
        }

        Ok(text.trim().to_string())
    }

    async fn spawn(&self, settings: &ServerSettings) -> SupervisorResult<SpawnedProcess> {
        let args = self.expand_args(settings);
        info!("Spawning {} {}", self.program, args.join(" "));

        let mut child = Command::new(&self.program)
            .args(&args)
            .env(PORT_ENV, settings.port.to_string())
            .env(TIMEOUT_ENV, settings.timeout_ms.to_string())
            .env(LOG_LEVEL_ENV, &settings.log_level)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SupervisorError::spawn_failed(format!("{}: {e}", self.program)))?;

        let pid = child.id();
        let (tx, rx) = mpsc::channel(PROCESS_EVENT_BUFFER);

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, tx.clone(), ProcessEvent::Stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, tx.clone(), ProcessEvent::Stderr));
        }

        tokio::spawn(async move {
            let event = match child.wait().await {
                Ok(status) => ProcessEvent::Exited {
                    code: status.code(),
                },
                Err(e) => ProcessEvent::Error(e.to_string()),
            };
            debug!("Server process {pid:?} finished: {event:?}");
            let _ = tx.send(event).await;
        });

        Ok(SpawnedProcess {
            handle: Box::new(CommandProcess { pid }),
            events: rx,
        })
    }
}

async fn forward_lines<R>(
    reader: R,
    tx: mpsc::Sender<ProcessEvent>,
    wrap: fn(String) -> ProcessEvent,
) where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(wrap(line)).await.is_err() {
            break;
        }
    }
}

/// Signals the child by pid; the child itself is owned by its wait task.
struct CommandProcess {
    pid: Option<u32>,
}

impl CommandProcess {
    fn require_pid(&self) -> SupervisorResult<u32> {
        self.pid
            .ok_or_else(|| SupervisorError::signal(0, "process has already been reaped"))
    }
}

impl ServerProcess for CommandProcess {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn terminate(&self) -> SupervisorResult<()> {
        let pid = self.require_pid()?;

        #[cfg(unix)]
        {
            use nix::sys::signal::Signal;
            send_signal(pid, Signal::SIGTERM)
        }

        #[cfg(windows)]
        {
            taskkill(pid, false)
        }
    }

    fn kill(&self) -> SupervisorResult<()> {
        let pid = self.require_pid()?;

        #[cfg(unix)]
        {
            use nix::sys::signal::Signal;
            send_signal(pid, Signal::SIGKILL)
        }

        #[cfg(windows)]
        {
            taskkill(pid, true)
        }
    }
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: nix::sys::signal::Signal) -> SupervisorResult<()> {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    kill(Pid::from_raw(pid as i32), signal).map_err(|e| SupervisorError::signal(pid, e.to_string()))
}

#[cfg(windows)]
fn taskkill(pid: u32, force: bool) -> SupervisorResult<()> {
    let pid_arg = pid.to_string();
    let mut args = vec!["/PID", pid_arg.as_str()];
    if force {
        args.insert(0, "/F");
    }

    std::process::Command::new("taskkill")
        .args(&args)
        .output()
        .map(|_| ())
        .map_err(|e| SupervisorError::signal(pid, e.to_string()))
}
