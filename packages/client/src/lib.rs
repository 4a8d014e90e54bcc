//! Terminal client for the Hiroba hub.
//!
//! Reads lines from the terminal, translates slash commands into protocol
//! frames and prints what the hub sends back. A lost connection is retried
//! with the id the server assigned, so missed messages are replayed.

pub mod error;
pub mod formatter;
pub mod input;
pub mod runner;
pub mod session;
pub mod ui;

pub use error::ClientError;
pub use runner::run_client;
