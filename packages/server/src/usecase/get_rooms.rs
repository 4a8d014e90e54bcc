//! UseCase: ルーム一覧取得

use std::sync::Arc;

use crate::domain::{MessageBroker, RoomSnapshot};

use super::error::ServiceError;

/// ルーム一覧取得のユースケース
pub struct GetRoomsUseCase {
    broker: Arc<dyn MessageBroker>,
}

impl GetRoomsUseCase {
    pub fn new(broker: Arc<dyn MessageBroker>) -> Self {
        Self { broker }
    }

    /// Every live room, sorted by name.
    pub async fn execute(&self) -> Result<Vec<RoomSnapshot>, ServiceError> {
        Ok(self.broker.snapshot().await?.rooms)
    }
}
