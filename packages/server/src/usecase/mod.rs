//! UseCase 層
//!
//! Each usecase drives the hub through the [`crate::domain::MessageBroker`]
//! trait, so they are tested against a mock broker.

pub mod connect_client;
pub mod disconnect_client;
pub mod dispatch_frame;
pub mod error;
pub mod get_hub_state;
pub mod get_room_detail;
pub mod get_rooms;

pub use connect_client::{Admission, ConnectClientUseCase};
pub use disconnect_client::{DisconnectClientUseCase, DisconnectReason};
pub use dispatch_frame::DispatchFrameUseCase;
pub use error::{ConnectError, DispatchError, GetRoomDetailError, ServiceError};
pub use get_hub_state::GetHubStateUseCase;
pub use get_room_detail::GetRoomDetailUseCase;
pub use get_rooms::GetRoomsUseCase;
