//! Translation of terminal input into protocol frames.
//!
//! | Input | Frame |
//! |---|---|
//! | `/join <room>` | `join_room:<room>` |
//! | `/leave <room>` | `leave_room:<room>` |
//! | `/room <room> <text>` | `room_message:<room> <text>` |
//! | `/msg <name> <text>` | `private_message:<name> <text>` |
//! | `/help` | (prints usage) |
//! | `/quit` | (closes the connection) |
//! | anything else | sent as is (global broadcast) |

use hiroba_shared::protocol::Command;
use thiserror::Error;

/// What one line of input asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Frame(String),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("unknown command '/{0}', type /help")]
    UnknownCommand(String),
}

pub const HELP: &str = "\
/join <room>          join a room
/leave <room>         leave a room
/room <room> <text>   send to a room
/msg <name> <text>    send to everyone named <name>
/quit                 exit
<text>                send to everyone";

/// Parse one line. Empty lines yield `None`.
pub fn parse_input(line: &str) -> Option<Result<Input, InputError>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(Ok(Input::Frame(line.to_string())));
    };

    let (command, args) = rest.split_once(' ').unwrap_or((rest, ""));
    let args = args.trim();
    let result = match command {
        "join" => single_arg(args, "/join <room>")
            .map(|room| Command::JoinRoom { room }.encode())
            .map(Input::Frame),
        "leave" => single_arg(args, "/leave <room>")
            .map(|room| Command::LeaveRoom { room }.encode())
            .map(Input::Frame),
        "room" => target_and_body(args, "/room <room> <text>")
            .map(|(room, body)| Command::RoomMessage { room, body }.encode())
            .map(Input::Frame),
        "msg" => target_and_body(args, "/msg <name> <text>")
            .map(|(recipient, body)| Command::PrivateMessage { recipient, body }.encode())
            .map(Input::Frame),
        "help" => Ok(Input::Help),
        "quit" | "exit" => Ok(Input::Quit),
        other => Err(InputError::UnknownCommand(other.to_string())),
    };
    Some(result)
}

fn single_arg(args: &str, usage: &'static str) -> Result<String, InputError> {
    if args.is_empty() || args.contains(char::is_whitespace) {
        return Err(InputError::Usage(usage));
    }
    Ok(args.to_string())
}

fn target_and_body(args: &str, usage: &'static str) -> Result<(String, String), InputError> {
    match args.split_once(' ') {
        Some((target, body)) if !body.trim().is_empty() => {
            Ok((target.to_string(), body.trim().to_string()))
        }
        _ => Err(InputError::Usage(usage)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(line: &str) -> String {
        match parse_input(line) {
            Some(Ok(Input::Frame(frame))) => frame,
            other => panic!("expected a frame for '{line}', got {other:?}"),
        }
    }

    #[test]
    fn test_slash_commands_translate_to_protocol_frames() {
        // テスト項目: スラッシュコマンドがプロトコルのフレームに変換される
        assert_eq!(frame("/join lobby"), "join_room:lobby");
        assert_eq!(frame("/leave lobby"), "leave_room:lobby");
        assert_eq!(frame("/room lobby hello there"), "room_message:lobby hello there");
        assert_eq!(frame("/msg root hi"), "private_message:root hi");
    }

    #[test]
    fn test_plain_text_is_sent_as_is() {
        // テスト項目: コマンドでない入力はそのまま全体配信として送られる
        assert_eq!(frame("  hello everyone "), "hello everyone");
    }

    #[test]
    fn test_empty_line_is_ignored() {
        // テスト項目: 空行は何も送らない
        assert_eq!(parse_input("   "), None);
    }

    #[test]
    fn test_control_commands() {
        // テスト項目: /help と /quit は送信せずクライアント側で処理される
        assert_eq!(parse_input("/help"), Some(Ok(Input::Help)));
        assert_eq!(parse_input("/quit"), Some(Ok(Input::Quit)));
    }

    #[test]
    fn test_invalid_commands_report_usage() {
        // テスト項目: 引数が不足・過剰なコマンドや未知のコマンドはエラーになる
        // when (操作):
        let missing_room = parse_input("/join");
        let spaced_room = parse_input("/join two rooms");
        let missing_body = parse_input("/msg root");
        let unknown = parse_input("/dance");

        // then (期待する結果):
        assert_eq!(missing_room, Some(Err(InputError::Usage("/join <room>"))));
        assert_eq!(spaced_room, Some(Err(InputError::Usage("/join <room>"))));
        assert_eq!(
            missing_body,
            Some(Err(InputError::Usage("/msg <name> <text>")))
        );
        assert_eq!(
            unknown,
            Some(Err(InputError::UnknownCommand("dance".to_string())))
        );
    }
}
