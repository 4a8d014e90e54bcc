//! UseCase: クライアント切断処理

use std::sync::Arc;

use crate::domain::{ConnectionId, Generation, MessageBroker};

use super::error::ServiceError;

/// How a transport ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The peer sent a Close frame: forget the connection now.
    Closed,
    /// Transport error, end of stream or idle timeout: keep the identity for
    /// a reconnect, along with what the write loop could not flush.
    Lost { undelivered: Vec<String> },
}

/// クライアント切断のユースケース
pub struct DisconnectClientUseCase {
    broker: Arc<dyn MessageBroker>,
}

impl DisconnectClientUseCase {
    pub fn new(broker: Arc<dyn MessageBroker>) -> Self {
        Self { broker }
    }

    /// Tear down one transport of `id`.
    ///
    /// A superseded `generation` is ignored by the hub, so a late teardown
    /// never removes a fresh reconnection.
    pub async fn execute(
        &self,
        id: ConnectionId,
        generation: Generation,
        reason: DisconnectReason,
    ) -> Result<(), ServiceError> {
        match reason {
            DisconnectReason::Closed => self.broker.unregister(id, generation).await?,
            DisconnectReason::Lost { undelivered } => {
                self.broker.detach(id, generation, undelivered).await?
            }
        }
        Ok(())
    }
}
