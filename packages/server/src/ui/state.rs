//! Shared application state.

use std::sync::Arc;

use crate::{
    config::PumpSettings,
    domain::MessageBroker,
    usecase::{
        ConnectClientUseCase, DisconnectClientUseCase, DispatchFrameUseCase, GetHubStateUseCase,
        GetRoomDetailUseCase, GetRoomsUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// ConnectClientUseCase（クライアント接続のユースケース）
    pub connect_client_usecase: Arc<ConnectClientUseCase>,
    /// DisconnectClientUseCase（クライアント切断のユースケース）
    pub disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    /// DispatchFrameUseCase（受信フレーム処理のユースケース）
    pub dispatch_frame_usecase: Arc<DispatchFrameUseCase>,
    /// GetRoomsUseCase（ルーム一覧取得のユースケース）
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// GetRoomDetailUseCase（ルーム詳細取得のユースケース）
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    /// GetHubStateUseCase（ハブ状態取得のユースケース）
    pub get_hub_state_usecase: Arc<GetHubStateUseCase>,
    /// Used to close every connection on shutdown
    pub broker: Arc<dyn MessageBroker>,
    pub pump_settings: PumpSettings,
}

impl AppState {
    /// Build every usecase on top of one broker.
    pub fn new(broker: Arc<dyn MessageBroker>, pump_settings: PumpSettings) -> Self {
        Self {
            connect_client_usecase: Arc::new(ConnectClientUseCase::new(broker.clone())),
            disconnect_client_usecase: Arc::new(DisconnectClientUseCase::new(broker.clone())),
            dispatch_frame_usecase: Arc::new(DispatchFrameUseCase::new(broker.clone())),
            get_rooms_usecase: Arc::new(GetRoomsUseCase::new(broker.clone())),
            get_room_detail_usecase: Arc::new(GetRoomDetailUseCase::new(broker.clone())),
            get_hub_state_usecase: Arc::new(GetHubStateUseCase::new(broker.clone())),
            broker,
            pump_settings,
        }
    }
}
