//! Hiroba: in-process real-time messaging hub.
//!
//! A single broker task owns every connection and room. WebSocket peers talk
//! to it through per-connection read and write loops; the HTTP API reads
//! snapshots of its state.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
