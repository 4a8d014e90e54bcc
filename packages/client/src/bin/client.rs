//! Terminal client for the Hiroba hub.
//!
//! Connects to the hub, sends what you type and prints what arrives.
//! Slash commands (`/join`, `/leave`, `/room`, `/msg`, `/quit`) map to the
//! hub's protocol; anything else is broadcast. A lost connection is retried
//! (max 5 attempts, 5 seconds apart) with the same connection id, so
//! messages sent meanwhile are replayed.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-client -- --name alice
//! cargo run --bin hiroba-client -- -n bob -u ws://127.0.0.1:3000/ws
//! ```

use clap::Parser;
use hiroba_shared::{
    logger::setup_logger,
    protocol::{DEFAULT_DISPLAY_NAME, is_valid_display_name},
};

#[derive(Parser, Debug)]
#[command(name = "hiroba-client")]
#[command(about = "Terminal client for the Hiroba messaging hub", long_about = None)]
struct Args {
    /// Display name other peers address with /msg
    #[arg(short = 'n', long, default_value = DEFAULT_DISPLAY_NAME)]
    name: String,

    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// Connection id from a previous run, to resume it
    #[arg(short = 'c', long)]
    client_id: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if !is_valid_display_name(&args.name) {
        tracing::error!(
            "Invalid name '{}': use 1-64 letters, digits, '_', '-' or '.'",
            args.name
        );
        std::process::exit(2);
    }

    if let Err(e) = hiroba_client::run_client(args.url, args.name, args.client_id).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
