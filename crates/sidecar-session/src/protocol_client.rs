use crate::ClientResult;

use async_trait::async_trait;
use serde_json::Value;

/// Request/response client for the reasoning server.
///
/// Errors are classified with [`crate::is_connection_error`], so transport
/// failures should carry recognisable messages ("not connected",
/// "ECONNREFUSED", ...).
#[async_trait]
pub trait ProtocolClient: Send + Sync {
    async fn connect(&self) -> ClientResult<()>;

    async fn disconnect(&self) -> ClientResult<()>;

    fn is_connected(&self) -> bool;

    async fn call_tool(&self, name: &str, args: Value) -> ClientResult<Value>;
}
