//! Request handlers.

mod http;
mod pump;
mod websocket;

pub use http::{debug_hub_state, get_room_detail, get_rooms, health_check};
pub use websocket::websocket_handler;
