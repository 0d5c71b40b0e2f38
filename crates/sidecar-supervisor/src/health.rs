//! Liveness probing of the server's listening port.

use crate::SERVER_HOST;

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::debug;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Decides whether the server on `port` is alive.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, port: u16) -> bool;
}

/// Healthy when a TCP connection to the port can be opened.
#[derive(Debug, Clone, Copy)]
pub struct TcpHealthProbe {
    connect_timeout: Duration,
}

impl TcpHealthProbe {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for TcpHealthProbe {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

#[async_trait]
impl HealthProbe for TcpHealthProbe {
    async fn probe(&self, port: u16) -> bool {
        match tokio::time::timeout(self.connect_timeout, TcpStream::connect((SERVER_HOST, port)))
            .await
        {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                debug!("Health probe on port {port} failed: {e}");
                false
            }
            Err(_) => {
                debug!(
                    "Health probe on port {port} timed out after {}ms",
                    self.connect_timeout.as_millis()
                );
                false
            }
        }
    }
}
