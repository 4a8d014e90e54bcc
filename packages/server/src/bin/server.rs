//! Hiroba hub server.
//!
//! Peers connect over WebSocket, join rooms and exchange room, private and
//! broadcast messages. A peer that loses its connection can come back with
//! the id it was given and receive what it missed.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-server
//! cargo run --bin hiroba-server -- --host 0.0.0.0 --port 3000 --reconnect-grace-secs 0
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use hiroba_server::{
    config::{
        DEFAULT_COMMAND_BUFFER, DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_MESSAGE_SIZE,
        DEFAULT_PING_INTERVAL, DEFAULT_QUEUE_CAPACITY, DEFAULT_RECONNECT_GRACE,
        DEFAULT_WRITE_TIMEOUT, HubConfig,
    },
    domain::DEFAULT_BACKLOG_CAPACITY,
    infrastructure::hub::Hub,
    ui::{AppState, Server},
};
use hiroba_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "hiroba-server")]
#[command(about = "Real-time messaging hub with rooms, private messages and reconnection replay", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Outbound queue slots per connection
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Messages kept per connection for replay after a reconnect
    #[arg(long, default_value_t = DEFAULT_BACKLOG_CAPACITY)]
    backlog_capacity: usize,

    /// Seconds between pings
    #[arg(long, default_value_t = DEFAULT_PING_INTERVAL.as_secs())]
    ping_interval_secs: u64,

    /// Seconds without any inbound frame before a connection counts as lost
    #[arg(long, default_value_t = DEFAULT_IDLE_TIMEOUT.as_secs())]
    idle_timeout_secs: u64,

    /// Seconds a single write may take
    #[arg(long, default_value_t = DEFAULT_WRITE_TIMEOUT.as_secs())]
    write_timeout_secs: u64,

    /// Largest inbound message accepted, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_MESSAGE_SIZE)]
    max_message_size: usize,

    /// Seconds a lost connection keeps its rooms and backlog (0 = forget immediately)
    #[arg(long, default_value_t = DEFAULT_RECONNECT_GRACE.as_secs())]
    reconnect_grace_secs: u64,

    /// Pending requests the hub channel holds
    #[arg(long, default_value_t = DEFAULT_COMMAND_BUFFER)]
    command_buffer: usize,

    /// Maximum number of connections (unbounded when omitted)
    #[arg(long)]
    max_connections: Option<usize>,

    /// Maximum number of rooms (unbounded when omitted)
    #[arg(long)]
    max_rooms: Option<usize>,
}

impl Args {
    fn hub_config(&self) -> HubConfig {
        HubConfig {
            queue_capacity: self.queue_capacity,
            backlog_capacity: self.backlog_capacity,
            ping_interval: Duration::from_secs(self.ping_interval_secs),
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            write_timeout: Duration::from_secs(self.write_timeout_secs),
            max_message_size: self.max_message_size,
            reconnect_grace: Duration::from_secs(self.reconnect_grace_secs),
            command_buffer: self.command_buffer,
            max_connections: self.max_connections,
            max_rooms: self.max_rooms,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Config
    // 2. Hub (broker task)
    // 3. AppState (UseCases)
    // 4. Server

    // 1. Validate config
    let config = args.hub_config();
    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        std::process::exit(2);
    }
    tracing::debug!("Hub configuration: {:?}", config);

    // 2. Spawn the hub; it must run before any connection is accepted
    let (hub, handle) = Hub::new(config.clone());
    let hub_task = tokio::spawn(hub.run());

    // 3. Create UseCases on top of the hub handle
    let state = AppState::new(Arc::new(handle), config.pump_settings());

    // 4. Create and run the server
    let server = Server::new(state);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = hub_task.await {
        tracing::error!("Hub task failed: {}", e);
        std::process::exit(1);
    }
}
