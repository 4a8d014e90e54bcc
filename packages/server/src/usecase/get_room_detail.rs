//! UseCase: ルーム詳細取得

use std::sync::Arc;

use crate::domain::{MessageBroker, RoomDetail};

use super::error::{GetRoomDetailError, ServiceError};

/// ルーム詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    broker: Arc<dyn MessageBroker>,
}

impl GetRoomDetailUseCase {
    pub fn new(broker: Arc<dyn MessageBroker>) -> Self {
        Self { broker }
    }

    /// # Returns
    ///
    /// * `Ok(RoomDetail)` - ルームとメンバーの接続情報
    /// * `Err(GetRoomDetailError::RoomNotFound)` - ルームが存在しない
    pub async fn execute(&self, room_name: String) -> Result<RoomDetail, GetRoomDetailError> {
        let snapshot = self
            .broker
            .snapshot()
            .await
            .map_err(ServiceError::from)?;
        snapshot
            .room_detail(&room_name)
            .ok_or(GetRoomDetailError::RoomNotFound(room_name))
    }
}
