//! Message formatting utilities for client display.

use hiroba_shared::{protocol::Reply, time::timestamp_to_jst_clock};

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the banner shown after each successful connection
    ///
    /// # Arguments
    ///
    /// * `connection_id` - Id assigned by the server (kept for reconnects)
    /// * `name` - Display name other peers address with `/msg`
    /// * `resumed` - Whether the server resumed a previous connection
    pub fn format_connected(connection_id: &str, name: &str, resumed: bool) -> String {
        let status = if resumed {
            "Reconnected, missed messages follow"
        } else {
            "Connected"
        };
        format!(
            "\n============================================================\n\
             {status} as '{name}' (id {connection_id})\n\
             Type /help for commands. Press Ctrl+C to exit.\n\
             ============================================================\n"
        )
    }

    /// Format one payload received from the hub
    ///
    /// Confirmation frames are rendered as status lines, anything else as a
    /// timestamped message.
    ///
    /// # Arguments
    ///
    /// * `payload` - A single payload (already split from a coalesced frame)
    /// * `received_at` - Unix timestamp (milliseconds)
    pub fn format_payload(payload: &str, received_at: i64) -> String {
        match Reply::parse(payload) {
            Some(Reply::JoinRoomSuccess(room)) => format!("\n* joined room '{}'\n", room),
            Some(Reply::JoinRoomFailed(room)) => {
                format!("\n! could not join room '{}' (room limit reached)\n", room)
            }
            Some(Reply::LeaveRoomSuccess(room)) => format!("\n* left room '{}'\n", room),
            None => format!(
                "\n[{}] {}\n",
                timestamp_to_jst_clock(received_at),
                payload
            ),
        }
    }

    /// Format a binary message notification
    pub fn format_binary_message(byte_count: usize) -> String {
        format!("\n← Received {} bytes of binary data\n", byte_count)
    }

    pub fn format_error(message: &str) -> String {
        format!("! {}\n", message)
    }
}
