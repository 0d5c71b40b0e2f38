use crate::{ConnectionCheckpoint, SessionId, SessionStatus, StoreResult};

use async_trait::async_trait;

/// Persistence owned by the embedding application.
#[async_trait]
pub trait SessionStateStore: Send + Sync {
    async fn save_checkpoint(
        &self,
        session_id: &SessionId,
        checkpoint: &ConnectionCheckpoint,
        description: &str,
    ) -> StoreResult<()>;

    async fn update_session_status(
        &self,
        session_id: &SessionId,
        status: SessionStatus,
    ) -> StoreResult<()>;
}
