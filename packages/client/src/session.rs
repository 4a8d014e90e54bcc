//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use hiroba_shared::{
    protocol::{CLIENT_ID_PARAM, CONNECTION_ID_HEADER, NAME_PARAM, split_frame},
    time::get_jst_timestamp,
};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, protocol::Message},
};

use crate::{
    error::ClientError,
    formatter::MessageFormatter,
    input::{HELP, Input, parse_input},
    ui::redisplay_prompt,
};

/// Upgrade URL carrying the display name and, when resuming, the previous id.
pub fn build_url(base: &str, name: &str, client_id: Option<&str>) -> String {
    let mut url = format!("{base}?{NAME_PARAM}={name}");
    if let Some(id) = client_id {
        url.push_str(&format!("&{CLIENT_ID_PARAM}={id}"));
    }
    url
}

fn connect_error(error: tungstenite::Error) -> ClientError {
    match error {
        tungstenite::Error::Http(response) => ClientError::Rejected {
            status: response.status().as_u16(),
            reason: response
                .body()
                .as_ref()
                .map(|body| String::from_utf8_lossy(body).into_owned())
                .unwrap_or_default(),
        },
        other => ClientError::ConnectionError(other.to_string()),
    }
}

/// Run one WebSocket session until the user quits or the connection drops.
///
/// `client_id` is updated with the id the server assigned, so the next
/// session resumes the same connection.
pub async fn run_client_session(
    url: &str,
    name: &str,
    client_id: &mut Option<String>,
    input_rx: &mut mpsc::UnboundedReceiver<String>,
) -> Result<(), ClientError> {
    let request_url = build_url(url, name, client_id.as_deref());
    let (ws_stream, response) = connect_async(&request_url).await.map_err(connect_error)?;

    let assigned = response
        .headers()
        .get(CONNECTION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| {
            ClientError::ConnectionError(format!("missing '{CONNECTION_ID_HEADER}' header"))
        })?;
    let resumed = client_id.as_deref() == Some(assigned.as_str());
    tracing::info!("Connected to hub as '{}' ({})", name, assigned);
    print!(
        "{}",
        MessageFormatter::format_connected(&assigned, name, resumed)
    );
    redisplay_prompt(name);
    *client_id = Some(assigned);

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    let received_at = get_jst_timestamp();
                    for payload in split_frame(text.as_str()) {
                        print!("{}", MessageFormatter::format_payload(payload, received_at));
                    }
                    redisplay_prompt(name);
                }
                Some(Ok(Message::Binary(data))) => {
                    print!("{}", MessageFormatter::format_binary_message(data.len()));
                    redisplay_prompt(name);
                }
                Some(Ok(Message::Close(_))) => {
                    tracing::info!("Server closed the connection");
                    return Err(ClientError::ConnectionLost(
                        "server closed the connection".to_string(),
                    ));
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    return Err(ClientError::ConnectionLost(e.to_string()));
                }
                None => {
                    return Err(ClientError::ConnectionLost("stream ended".to_string()));
                }
            },
            line = input_rx.recv() => {
                // Readline thread ended: Ctrl+C or Ctrl+D
                let Some(line) = line else {
                    let _ = write.close().await;
                    return Ok(());
                };
                match parse_input(&line) {
                    None => {}
                    Some(Ok(Input::Frame(frame))) => {
                        if let Err(e) = write.send(Message::Text(frame.into())).await {
                            tracing::warn!("Failed to send message: {}", e);
                            return Err(ClientError::ConnectionLost(e.to_string()));
                        }
                    }
                    Some(Ok(Input::Help)) => println!("{HELP}"),
                    Some(Ok(Input::Quit)) => {
                        let _ = write.close().await;
                        return Ok(());
                    }
                    Some(Err(e)) => print!("{}", MessageFormatter::format_error(&e.to_string())),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_without_client_id() {
        // テスト項目: 初回接続の URL には表示名だけが含まれる
        // when (操作):
        let url = build_url("ws://127.0.0.1:8080/ws", "alice", None);

        // then (期待する結果):
        assert_eq!(url, "ws://127.0.0.1:8080/ws?name=alice");
    }

    #[test]
    fn test_build_url_resumes_client_id() {
        // テスト項目: 再接続の URL には前回割り当てられた ID が含まれる
        // when (操作):
        let url = build_url("ws://127.0.0.1:8080/ws", "alice", Some("abc-123"));

        // then (期待する結果):
        assert_eq!(url, "ws://127.0.0.1:8080/ws?name=alice&client_id=abc-123");
    }
}
