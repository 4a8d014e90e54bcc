//! Text wire protocol spoken between peers and the hub.
//!
//! Every inbound frame is normalized (newlines become spaces, surrounding
//! whitespace trimmed) and then dispatched on its prefix:
//!
//! | Prefix | Format |
//! |---|---|
//! | `join_room:` | `join_room:<room>` |
//! | `room_message:` | `room_message:<room> <body>` |
//! | `leave_room:` | `leave_room:<room>` |
//! | `private_message:` | `private_message:<name> <body>` |
//! | (anything else) | global broadcast of the whole frame |
//!
//! Room names (1 to 128 characters) and display names (1 to 64 characters
//! of ASCII letters, digits, `_`, `-` and `.`) may not contain whitespace.
//! A frame naming an invalid room or recipient, such as `join_room:my room`,
//! is dropped by the hub without a reply.
//!
//! Outbound frames may carry several payloads joined by [`FRAME_SEPARATOR`]
//! when the hub coalesces queued messages into one write.

use thiserror::Error;

pub const JOIN_ROOM: &str = "join_room:";
pub const ROOM_MESSAGE: &str = "room_message:";
pub const LEAVE_ROOM: &str = "leave_room:";
pub const PRIVATE_MESSAGE: &str = "private_message:";

pub const JOIN_ROOM_SUCCESS: &str = "join_room_success:";
pub const JOIN_ROOM_FAILED: &str = "join_room_failed:";
pub const LEAVE_ROOM_SUCCESS: &str = "leave_room_success:";

/// Separator between payloads coalesced into one outbound frame.
pub const FRAME_SEPARATOR: char = '\n';

/// Response header carrying the connection id assigned at upgrade.
pub const CONNECTION_ID_HEADER: &str = "x-connection-id";
/// Query parameter used to resume a previous connection id.
pub const CLIENT_ID_PARAM: &str = "client_id";
/// Query parameter carrying the display name.
pub const NAME_PARAM: &str = "name";
/// Display name used when the peer does not choose one.
pub const DEFAULT_DISPLAY_NAME: &str = "root";

/// Errors raised while parsing an inbound frame
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("frame is empty")]
    EmptyFrame,

    #[error("'{0}' command without a room name")]
    MissingRoomName(&'static str),

    #[error("'{0}' command without a message body")]
    MissingBody(&'static str),

    #[error("private message without a recipient")]
    MissingRecipient,
}

/// A parsed inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    JoinRoom { room: String },
    RoomMessage { room: String, body: String },
    LeaveRoom { room: String },
    PrivateMessage { recipient: String, body: String },
    Broadcast { body: String },
}

/// Newlines become spaces and surrounding whitespace is trimmed.
pub fn normalize(frame: &str) -> String {
    frame.replace(['\r', '\n'], " ").trim().to_string()
}

impl Command {
    /// Parse a raw text frame into a command.
    pub fn parse(frame: &str) -> Result<Self, ProtocolError> {
        let frame = normalize(frame);
        if frame.is_empty() {
            return Err(ProtocolError::EmptyFrame);
        }

        if let Some(rest) = frame.strip_prefix(JOIN_ROOM) {
            let room = parse_room(rest, JOIN_ROOM)?;
            return Ok(Self::JoinRoom { room });
        }
        if let Some(rest) = frame.strip_prefix(LEAVE_ROOM) {
            let room = parse_room(rest, LEAVE_ROOM)?;
            return Ok(Self::LeaveRoom { room });
        }
        if let Some(rest) = frame.strip_prefix(ROOM_MESSAGE) {
            let (room, body) = split_target(rest, ROOM_MESSAGE)
                .map_err(|missing| missing.unwrap_or(ProtocolError::MissingRoomName(ROOM_MESSAGE)))?;
            return Ok(Self::RoomMessage { room, body });
        }
        if let Some(rest) = frame.strip_prefix(PRIVATE_MESSAGE) {
            let (recipient, body) = split_target(rest, PRIVATE_MESSAGE)
                .map_err(|missing| missing.unwrap_or(ProtocolError::MissingRecipient))?;
            return Ok(Self::PrivateMessage { recipient, body });
        }

        Ok(Self::Broadcast { body: frame })
    }

    /// Render the command as a text frame.
    pub fn encode(&self) -> String {
        match self {
            Self::JoinRoom { room } => format!("{JOIN_ROOM}{room}"),
            Self::RoomMessage { room, body } => format!("{ROOM_MESSAGE}{room} {body}"),
            Self::LeaveRoom { room } => format!("{LEAVE_ROOM}{room}"),
            Self::PrivateMessage { recipient, body } => {
                format!("{PRIVATE_MESSAGE}{recipient} {body}")
            }
            Self::Broadcast { body } => body.clone(),
        }
    }
}

fn parse_room(rest: &str, command: &'static str) -> Result<String, ProtocolError> {
    let room = rest.trim();
    if room.is_empty() {
        return Err(ProtocolError::MissingRoomName(command));
    }
    Ok(room.to_string())
}

/// Split `<target> <body>`.
///
/// `Err(None)` means the target is missing; the caller picks the error.
fn split_target(
    rest: &str,
    command: &'static str,
) -> Result<(String, String), Option<ProtocolError>> {
    match rest.split_once(' ') {
        Some((target, _)) if target.is_empty() => Err(None),
        Some((_, body)) if body.trim().is_empty() => Err(Some(ProtocolError::MissingBody(command))),
        Some((target, body)) => Ok((target.to_string(), body.to_string())),
        None if rest.is_empty() => Err(None),
        None => Err(Some(ProtocolError::MissingBody(command))),
    }
}

/// Confirmation frames the hub sends back to the caller only
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    JoinRoomSuccess(String),
    JoinRoomFailed(String),
    LeaveRoomSuccess(String),
}

impl Reply {
    pub fn encode(&self) -> String {
        match self {
            Self::JoinRoomSuccess(room) => format!("{JOIN_ROOM_SUCCESS}{room}"),
            Self::JoinRoomFailed(room) => format!("{JOIN_ROOM_FAILED}{room}"),
            Self::LeaveRoomSuccess(room) => format!("{LEAVE_ROOM_SUCCESS}{room}"),
        }
    }

    /// Recognize a confirmation frame; anything else is a plain payload.
    pub fn parse(frame: &str) -> Option<Self> {
        if let Some(room) = frame.strip_prefix(JOIN_ROOM_SUCCESS) {
            return Some(Self::JoinRoomSuccess(room.to_string()));
        }
        if let Some(room) = frame.strip_prefix(JOIN_ROOM_FAILED) {
            return Some(Self::JoinRoomFailed(room.to_string()));
        }
        frame
            .strip_prefix(LEAVE_ROOM_SUCCESS)
            .map(|room| Self::LeaveRoomSuccess(room.to_string()))
    }
}

/// Display names are addressed by `private_message:<name> <body>`, so they
/// may not contain whitespace; they also travel in a query string.
pub fn is_valid_display_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Split a (possibly coalesced) outbound frame into its payloads.
pub fn split_frame(frame: &str) -> impl Iterator<Item = &str> {
    frame.split(FRAME_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_join_room() {
        // テスト項目: join_room コマンドがルーム名付きで解析される
        // given (前提条件):
        let frame = "join_room:lobby";

        // when (操作):
        let result = Command::parse(frame);

        // then (期待する結果):
        assert_eq!(
            result,
            Ok(Command::JoinRoom {
                room: "lobby".to_string()
            })
        );
    }

    #[test]
    fn test_parse_normalizes_newlines_and_whitespace() {
        // テスト項目: 改行は空白に置換され、前後の空白は除去される
        // given (前提条件):
        let frame = "  room_message:lobby hello\nworld \n";

        // when (操作):
        let result = Command::parse(frame);

        // then (期待する結果):
        assert_eq!(
            result,
            Ok(Command::RoomMessage {
                room: "lobby".to_string(),
                body: "hello world".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_private_message_keeps_spaces_in_body() {
        // テスト項目: 本文中の空白は保持される
        // given (前提条件):
        let frame = "private_message:root hi there";

        // when (操作):
        let result = Command::parse(frame);

        // then (期待する結果):
        assert_eq!(
            result,
            Ok(Command::PrivateMessage {
                recipient: "root".to_string(),
                body: "hi there".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_unknown_prefix_is_broadcast() {
        // テスト項目: 既知のプレフィックスでないフレームはブロードキャストになる
        // given (前提条件):
        let frame = "hello: everyone";

        // when (操作):
        let result = Command::parse(frame);

        // then (期待する結果):
        assert_eq!(
            result,
            Ok(Command::Broadcast {
                body: "hello: everyone".to_string()
            })
        );
    }

    #[test]
    fn test_parse_malformed_frames() {
        // テスト項目: 不正なフレームはそれぞれのエラーになる
        // given (前提条件):
        let cases = [
            ("   \n ", ProtocolError::EmptyFrame),
            ("join_room:", ProtocolError::MissingRoomName(JOIN_ROOM)),
            ("leave_room:   ", ProtocolError::MissingRoomName(LEAVE_ROOM)),
            ("room_message:lobby", ProtocolError::MissingBody(ROOM_MESSAGE)),
            ("room_message: hello", ProtocolError::MissingRoomName(ROOM_MESSAGE)),
            ("room_message:", ProtocolError::MissingRoomName(ROOM_MESSAGE)),
            ("private_message:root", ProtocolError::MissingBody(PRIVATE_MESSAGE)),
            ("private_message: hi", ProtocolError::MissingRecipient),
        ];

        for (frame, expected) in cases {
            // when (操作):
            let result = Command::parse(frame);

            // then (期待する結果):
            assert_eq!(result, Err(expected), "frame: {frame:?}");
        }
    }

    #[test]
    fn test_encoded_command_parses_back() {
        // テスト項目: encode した文字列は同じコマンドとして解析される
        // given (前提条件):
        let command = Command::RoomMessage {
            room: "lobby".to_string(),
            body: "see you".to_string(),
        };

        // when (操作):
        let result = Command::parse(&command.encode());

        // then (期待する結果):
        assert_eq!(result, Ok(command));
    }

    #[test]
    fn test_reply_parse_recognizes_confirmations() {
        // テスト項目: 確認フレームは Reply として認識され、それ以外は None
        // given (前提条件):
        let joined = Reply::JoinRoomSuccess("lobby".to_string()).encode();

        // when (操作):
        let parsed = Reply::parse(&joined);
        let plain = Reply::parse("hello");

        // then (期待する結果):
        assert_eq!(joined, "join_room_success:lobby");
        assert_eq!(parsed, Some(Reply::JoinRoomSuccess("lobby".to_string())));
        assert_eq!(
            Reply::parse("leave_room_success:lobby"),
            Some(Reply::LeaveRoomSuccess("lobby".to_string()))
        );
        assert_eq!(plain, None);
    }

    #[test]
    fn test_display_name_validation() {
        // テスト項目: 表示名は英数字と _-. のみ許可される
        assert!(is_valid_display_name("root"));
        assert!(is_valid_display_name("alice_01.dev-x"));
        assert!(!is_valid_display_name(""));
        assert!(!is_valid_display_name("two words"));
        assert!(!is_valid_display_name("a&b"));
        assert!(!is_valid_display_name(&"x".repeat(65)));
    }

    #[test]
    fn test_split_frame_separates_coalesced_payloads() {
        // テスト項目: 結合されたフレームが個々のペイロードに分割される
        let payloads: Vec<&str> = split_frame("one\ntwo\nthree").collect();
        assert_eq!(payloads, vec!["one", "two", "three"]);
    }
}
