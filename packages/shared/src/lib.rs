//! Code shared by the Hiroba server and client.
//!
//! - `protocol`: text wire protocol spoken over the WebSocket
//! - `logger`: tracing subscriber setup for the binaries
//! - `time`: JST timestamps and a clock abstraction

pub mod logger;
pub mod protocol;
pub mod time;
