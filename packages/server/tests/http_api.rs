//! HTTP API tests against an in-process server.

mod common;

use serde_json::Value;

use common::{Peer, TestServer};

async fn get_json(url: &str) -> (u16, Value) {
    let response = reqwest::get(url).await.expect("request should succeed");
    let status = response.status().as_u16();
    let body = response.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health_check() {
    // テスト項目: ヘルスチェックが ok を返す
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let (status, body) = get_json(&server.http_url("/api/health")).await;

    // then (期待する結果):
    assert_eq!(status, 200);
    assert_eq!(body, serde_json::json!({"status": "ok"}));
}

#[tokio::test]
async fn test_rooms_are_listed_by_name() {
    // テスト項目: ルーム一覧は名前順で、メンバーの接続 ID を含む
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = Peer::connect(&server, "name=alice").await;
    let mut bob = Peer::connect(&server, "name=bob").await;
    alice.join("zeta").await;
    bob.join("alpha").await;
    alice.join("alpha").await;

    // when (操作):
    let (status, body) = get_json(&server.http_url("/api/rooms")).await;

    // then (期待する結果):
    assert_eq!(status, 200);
    let rooms = body.as_array().unwrap();
    assert_eq!(rooms.len(), 2);
    assert_eq!(rooms[0]["name"], "alpha");
    assert_eq!(rooms[0]["members"].as_array().unwrap().len(), 2);
    assert_eq!(rooms[1]["name"], "zeta");
    assert_eq!(rooms[1]["members"][0], alice.id.as_str());
}

#[tokio::test]
async fn test_room_detail_shows_member_names() {
    // テスト項目: ルーム詳細にメンバーの表示名と接続時刻が含まれる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = Peer::connect(&server, "name=alice").await;
    alice.join("lobby").await;

    // when (操作):
    let (status, body) = get_json(&server.http_url("/api/rooms/lobby")).await;

    // then (期待する結果):
    assert_eq!(status, 200);
    assert_eq!(body["name"], "lobby");
    let member = &body["members"][0];
    assert_eq!(member["connection_id"], alice.id.as_str());
    assert_eq!(member["display_name"], "alice");
    assert!(member["connected_at"].as_str().unwrap().ends_with("+09:00"));
}

#[tokio::test]
async fn test_missing_room_is_404() {
    // テスト項目: 存在しないルームの詳細は 404 になる
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let (status, _) = get_json(&server.http_url("/api/rooms/ghost")).await;

    // then (期待する結果):
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_debug_hub_reports_connections() {
    // テスト項目: デバッグ用エンドポイントが接続の状態・バックログ・所属ルームを返す
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = Peer::connect(&server, "name=alice").await;
    alice.join("lobby").await;

    // when (操作):
    let (status, body) = get_json(&server.http_url("/debug/hub")).await;

    // then (期待する結果):
    assert_eq!(status, 200);
    let connection = &body["connections"][0];
    assert_eq!(connection["connection_id"], alice.id.as_str());
    assert_eq!(connection["state"], "live");
    assert!(connection.get("detached_at").is_none());
    assert_eq!(connection["backlog_len"], 0);
    assert_eq!(connection["rooms"], serde_json::json!(["lobby"]));
    assert_eq!(body["rooms"][0]["name"], "lobby");
}
