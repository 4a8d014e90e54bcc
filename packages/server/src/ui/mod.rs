//! UI layer: Axum router, WebSocket and HTTP handlers, and the per-connection
//! pumps.

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
pub use signal::shutdown_signal;
pub use state::AppState;
