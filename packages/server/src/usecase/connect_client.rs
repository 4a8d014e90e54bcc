//! UseCase: クライアント接続処理
//!
//! Connecting happens in two steps around the WebSocket upgrade:
//! [`ConnectClientUseCase::admit`] validates the query and resolves the
//! connection id (so it can go into the upgrade response), then
//! [`ConnectClientUseCase::execute`] registers the transport once the socket
//! exists.

use std::sync::Arc;

use crate::domain::{ConnectionId, DisplayName, Generation, MessageBroker, OutboundSender};

use super::error::ConnectError;

/// Identity resolved before the upgrade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub id: ConnectionId,
    pub name: DisplayName,
}

/// クライアント接続のユースケース
pub struct ConnectClientUseCase {
    broker: Arc<dyn MessageBroker>,
}

impl ConnectClientUseCase {
    pub fn new(broker: Arc<dyn MessageBroker>) -> Self {
        Self { broker }
    }

    /// Validate the raw query values and reserve an identity.
    ///
    /// An empty `client_id` counts as absent. A well-formed but unknown id
    /// is replaced by a fresh one.
    ///
    /// # Returns
    ///
    /// * `Ok(Admission)` - 接続可能（ID と表示名が確定）
    /// * `Err(ConnectError)` - 不正な値、接続数上限、またはハブ停止
    pub async fn admit(
        &self,
        client_id: Option<String>,
        name: Option<String>,
    ) -> Result<Admission, ConnectError> {
        let requested = match client_id.filter(|value| !value.is_empty()) {
            Some(value) => Some(ConnectionId::new(value).map_err(ConnectError::InvalidClientId)?),
            None => None,
        };
        let name = match name {
            Some(value) => DisplayName::new(value).map_err(ConnectError::InvalidDisplayName)?,
            None => DisplayName::default(),
        };

        let id = self.broker.admit(requested).await?;
        Ok(Admission { id, name })
    }

    /// Register the upgraded transport.
    ///
    /// # Returns
    ///
    /// * `Ok(Generation)` - この接続の世代（切断時に使う）
    /// * `Err(ConnectError::ConnectionLimitReached)` - 受け入れ後に接続数の上限に達した
    /// * `Err(ConnectError::HubUnavailable)` - ハブが停止している
    pub async fn execute(
        &self,
        admission: Admission,
        outbound: OutboundSender,
    ) -> Result<Generation, ConnectError> {
        let generation = self
            .broker
            .register(admission.id, admission.name, outbound)
            .await?;
        Ok(generation)
    }
}
