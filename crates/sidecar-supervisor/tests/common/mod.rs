#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use sidecar_supervisor::{CommandLauncher, ProcessEvent, ServerSettings, SpawnedProcess};
use tokio::net::TcpListener;

/// Stand-in for the server's listening socket.
pub async fn listening_port() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

pub fn settings(port: u16) -> ServerSettings {
    ServerSettings {
        port,
        timeout_ms: 30000,
        log_level: "debug".to_string(),
    }
}

/// Launcher running `sh -c <script>`; the version command echoes `version_output`.
pub fn sh_launcher(script: &str, version_output: &str) -> Arc<CommandLauncher> {
    Arc::new(CommandLauncher::new(
        "sh",
        vec!["-c".to_string(), script.to_string()],
        vec!["-c".to_string(), format!("echo {version_output}")],
    ))
}

/// Wait for the next event matching `predicate`.
pub async fn next_event(
    spawned: &mut SpawnedProcess,
    predicate: impl Fn(&ProcessEvent) -> bool,
) -> ProcessEvent {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let event = spawned.events.recv().await.expect("event stream closed");
            if predicate(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for process event")
}
