//! Integration tests for the pong server.
//!
//! These tests start a real server instance and drive it over HTTP and
//! WebSocket to verify end-to-end behavior.

use futures_util::{SinkExt, StreamExt};
use pong_server::config::ServerConfig;
use pong_server::game_loop::spawn_match;
use pong_server::http::{router, AppState};
use pong_shared::protocol::{ClientMsg, ServerMsg, StateSnapshot};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{connect_async, tungstenite::Message};

type Ws =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Start a test server on a random available port and return its address.
async fn start_test_server() -> SocketAddr {
    let config = ServerConfig {
        listen_addr: "127.0.0.1:0".to_string(),
        command_buffer: 64,
        broadcast_buffer: 64,
        ..Default::default()
    };

    let listener = TcpListener::bind(&config.listen_addr).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (game, broadcast_tx) = spawn_match(
        config.match_config,
        config.command_buffer,
        config.broadcast_buffer,
    );
    let app = router(AppState::new(game, broadcast_tx));

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

async fn connect(addr: &SocketAddr) -> Ws {
    let url = format!("ws://{}/ws", addr);
    let (ws, _) = connect_async(&url).await.expect("Failed to connect");
    ws
}

/// Send one HTTP/1.1 request and return the status code and JSON body.
async fn http(
    addr: &SocketAddr,
    method: &str,
    path: &str,
    body: Option<&str>,
) -> (u16, serde_json::Value) {
    let body = body.unwrap_or("");
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\
         Content-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut raw = Vec::new();
    tokio::time::timeout(Duration::from_secs(2), stream.read_to_end(&mut raw))
        .await
        .expect("Timed out waiting for HTTP response")
        .unwrap();

    let raw = String::from_utf8(raw).unwrap();
    let (head, payload) = raw.split_once("\r\n\r\n").expect("Malformed HTTP response");
    let status = head
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .expect("Missing status code");
    let json = if payload.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_str(payload).expect("Response body is not JSON")
    };
    (status, json)
}

async fn send(ws: &mut Ws, msg: &ClientMsg) {
    let json = serde_json::to_string(msg).unwrap();
    ws.send(Message::Text(json.into())).await.unwrap();
}

/// Read the next text message and parse as ServerMsg.
async fn recv_msg(ws: &mut Ws) -> ServerMsg {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                return serde_json::from_str(&text).expect("Failed to parse server message");
            }
            Some(Ok(_)) => continue, // Skip ping/pong
            Some(Err(e)) => panic!("WebSocket error: {}", e),
            None => panic!("WebSocket closed unexpectedly"),
        }
    }
}

async fn recv_state(ws: &mut Ws) -> StateSnapshot {
    let msg = tokio::time::timeout(Duration::from_secs(2), recv_msg(ws))
        .await
        .expect("Timed out waiting for state");
    match msg {
        ServerMsg::State(state) => state,
        other => panic!("Expected State, got {:?}", other),
    }
}

/// True once the server has closed the connection.
async fn wait_for_disconnect(ws: &mut Ws) -> bool {
    for _ in 0..10 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        match tokio::time::timeout(Duration::from_millis(100), ws.next()).await {
            Ok(Some(Ok(Message::Close(_)))) | Ok(None) | Ok(Some(Err(_))) => return true,
            Err(_) => {
                // Timeout - try sending to check if connection is dead
                if ws.send(Message::Ping(vec![].into())).await.is_err() {
                    return true;
                }
            }
            _ => continue,
        }
    }
    false
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_connect_receives_kickoff_state() {
    let addr = start_test_server().await;
    let mut ws = connect(&addr).await;

    let state = recv_state(&mut ws).await;
    assert_eq!(state.ball.x, 400.0);
    assert_eq!(state.ball.y, 300.0);
    assert_eq!(state.paddle1.y, 250.0);
    assert_eq!(state.paddle2.y, 250.0);
    assert!(!state.game_over);
    assert_eq!(state.winner, None);
}

#[tokio::test]
async fn test_tick_is_broadcast_back() {
    let addr = start_test_server().await;
    let mut ws = connect(&addr).await;
    let _kickoff = recv_state(&mut ws).await;

    send(&mut ws, &ClientMsg::Tick).await;
    let state = recv_state(&mut ws).await;
    assert_eq!(state.ball.x, 405.0);
    assert_eq!(state.ball.y, 303.0);
}

#[tokio::test]
async fn test_move_reaches_other_spectators() {
    let addr = start_test_server().await;
    let mut player = connect(&addr).await;
    let mut spectator = connect(&addr).await;
    let _ = recv_state(&mut player).await;
    let _ = recv_state(&mut spectator).await;

    send(
        &mut player,
        &ClientMsg::Move {
            paddle: 2,
            direction: "down".to_string(),
        },
    )
    .await;

    let seen = recv_state(&mut spectator).await;
    assert_eq!(seen.paddle2.y, 258.0);
    assert_eq!(seen.paddle1.y, 250.0);
}

#[tokio::test]
async fn test_invalid_move_returns_error() {
    let addr = start_test_server().await;
    let mut ws = connect(&addr).await;
    let _ = recv_state(&mut ws).await;

    send(
        &mut ws,
        &ClientMsg::Move {
            paddle: 3,
            direction: "up".to_string(),
        },
    )
    .await;

    let msg = tokio::time::timeout(Duration::from_secs(2), recv_msg(&mut ws))
        .await
        .unwrap();
    match msg {
        ServerMsg::Error(e) => assert!(e.error.contains("invalid paddle")),
        other => panic!("Expected Error, got {:?}", other),
    }

    // State untouched
    send(&mut ws, &ClientMsg::State).await;
    let state = recv_state(&mut ws).await;
    assert_eq!(state.paddle1.y, 250.0);
    assert_eq!(state.paddle2.y, 250.0);
}

#[tokio::test]
async fn test_reset_restores_kickoff() {
    let addr = start_test_server().await;
    let mut ws = connect(&addr).await;
    let _ = recv_state(&mut ws).await;

    for _ in 0..5 {
        send(&mut ws, &ClientMsg::Tick).await;
        let _ = recv_state(&mut ws).await;
    }

    send(&mut ws, &ClientMsg::Reset).await;
    let state = recv_state(&mut ws).await;
    assert_eq!(state.ball.x, 400.0);
    assert_eq!(state.ball.y, 300.0);
    assert_eq!(state.scores.player1, 0);
    assert_eq!(state.scores.player2, 0);
}

#[tokio::test]
async fn test_full_match_over_websocket() {
    let addr = start_test_server().await;
    let mut ws = connect(&addr).await;
    let _ = recv_state(&mut ws).await;

    let mut state = None;
    for _ in 0..729 {
        send(&mut ws, &ClientMsg::Tick).await;
        state = Some(recv_state(&mut ws).await);
    }
    let state = state.unwrap();
    assert!(state.game_over);
    let json = serde_json::to_value(&state).unwrap();
    assert_eq!(json["winner"], "player1");
    assert_eq!(json["scores"]["player1"], 5);

    send(&mut ws, &ClientMsg::Tick).await;
    assert_eq!(recv_state(&mut ws).await, state);
}

#[tokio::test]
async fn test_oversized_message_disconnects_client() {
    let addr = start_test_server().await;
    let mut ws = connect(&addr).await;
    let _ = recv_state(&mut ws).await;

    let huge_payload = "x".repeat(2000);
    let msg = format!(r#"{{"type":"tick","extra":"{}"}}"#, huge_payload);
    let _ = ws.send(Message::Text(msg.into())).await;

    assert!(
        wait_for_disconnect(&mut ws).await,
        "Client should be disconnected after oversized message"
    );
}

#[tokio::test]
async fn test_parse_spam_disconnects_client() {
    let addr = start_test_server().await;
    let mut ws = connect(&addr).await;
    let _ = recv_state(&mut ws).await;

    for _ in 0..10 {
        let _ = ws.send(Message::Text("not valid json".into())).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert!(
        wait_for_disconnect(&mut ws).await,
        "Client should be disconnected after too many parse errors"
    );
}

#[tokio::test]
async fn test_http_move_moves_paddle() {
    let addr = start_test_server().await;

    let (status, body) = http(
        &addr,
        "POST",
        "/api/game/move",
        Some(r#"{"paddle":2,"direction":"down"}"#),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Paddle moved successfully");

    let (status, state) = http(&addr, "GET", "/api/game/state", None).await;
    assert_eq!(status, 200);
    assert_eq!(state["paddle2"]["y"], 258.0);
    assert_eq!(state["paddle1"]["y"], 250.0);
}

#[tokio::test]
async fn test_http_malformed_move_is_rejected() {
    let addr = start_test_server().await;

    for body in [
        "not json",
        r#"{"paddle":"one","direction":"up"}"#,
        r#"{"paddle":1,"direction":7}"#,
        r#"{"paddle":3,"direction":"up"}"#,
    ] {
        let (status, json) = http(&addr, "POST", "/api/game/move", Some(body)).await;
        assert_eq!(status, 400, "body {body:?}");
        assert_eq!(json, serde_json::json!({"error": "Invalid paddle or direction"}));
    }

    let (_, state) = http(&addr, "GET", "/api/game/state", None).await;
    assert_eq!(state["paddle1"]["y"], 250.0);
    assert_eq!(state["paddle2"]["y"], 250.0);
}

#[tokio::test]
async fn test_http_update_and_reset() {
    let addr = start_test_server().await;

    let (status, state) = http(&addr, "POST", "/api/game/update", None).await;
    assert_eq!(status, 200);
    assert_eq!(state["ball"]["x"], 405.0);
    assert_eq!(state["ball"]["y"], 303.0);

    let (status, state) = http(&addr, "POST", "/api/game/reset", None).await;
    assert_eq!(status, 200);
    assert_eq!(state["ball"]["x"], 400.0);
    assert_eq!(state["game_over"], false);

    let (status, _) = http(&addr, "GET", "/api/game/update", None).await;
    assert_eq!(status, 405);
}

#[tokio::test]
async fn test_http_players() {
    let addr = start_test_server().await;

    let (status, created) = http(&addr, "POST", "/api/players", Some(r#"{"name":" alice "}"#)).await;
    assert_eq!(status, 200);
    assert_eq!(created["id"], 1);
    assert_eq!(created["name"], "alice");
    assert_eq!(created["message"], "Player created successfully");

    let (status, json) = http(&addr, "POST", "/api/players", Some(r#"{"name":"alice"}"#)).await;
    assert_eq!(status, 400);
    assert_eq!(json, serde_json::json!({"error": "Player name already exists"}));

    let (status, json) = http(&addr, "POST", "/api/players", Some(r#"{"name":"   "}"#)).await;
    assert_eq!(status, 400);
    assert_eq!(json, serde_json::json!({"error": "Name is required"}));

    // Body that is not JSON at all
    let (status, json) = http(&addr, "POST", "/api/players", Some("{name")).await;
    assert_eq!(status, 400);
    assert!(!json["error"].as_str().unwrap().is_empty());

    let (status, players) = http(&addr, "GET", "/api/players", None).await;
    assert_eq!(status, 200);
    assert_eq!(players.as_array().unwrap().len(), 1);
    assert_eq!(players[0]["name"], "alice");
}

#[tokio::test]
async fn test_http_games_and_leaderboard() {
    let addr = start_test_server().await;

    let (_, alice) = http(&addr, "POST", "/api/players", Some(r#"{"name":"alice"}"#)).await;
    let (_, bob) = http(&addr, "POST", "/api/players", Some(r#"{"name":"bob"}"#)).await;
    assert_eq!(alice["id"], 1);
    assert_eq!(bob["id"], 2);

    let game = r#"{"player1_id":1,"player2_id":2,"player1_score":3,"player2_score":5,"winner_id":2,"game_duration":42}"#;
    let (status, saved) = http(&addr, "POST", "/api/games", Some(game)).await;
    assert_eq!(status, 200);
    assert_eq!(saved["id"], 1);
    assert_eq!(saved["message"], "Game saved successfully");

    let (status, json) = http(
        &addr,
        "POST",
        "/api/games",
        Some(r#"{"player1_score":"three"}"#),
    )
    .await;
    assert_eq!(status, 400);
    assert!(json["error"].is_string());

    let (status, games) = http(&addr, "GET", "/api/games", None).await;
    assert_eq!(status, 200);
    assert_eq!(games.as_array().unwrap().len(), 1);
    assert_eq!(games[0]["player1_name"], "alice");
    assert_eq!(games[0]["player2_name"], "bob");
    assert_eq!(games[0]["winner_id"], 2);

    let (status, board) = http(&addr, "GET", "/api/leaderboard", None).await;
    assert_eq!(status, 200);
    assert_eq!(
        board,
        serde_json::json!([
            {"name": "bob", "wins": 1},
            {"name": "alice", "wins": 0}
        ])
    );
}
