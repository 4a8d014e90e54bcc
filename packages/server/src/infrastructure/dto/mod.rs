//! Data Transfer Objects (DTOs) for the HTTP API.
//!
//! The WebSocket protocol is plain text and lives in `hiroba_shared::protocol`.

pub mod http;
