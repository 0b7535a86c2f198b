use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{Sink, SinkExt, StreamExt};
use pong_shared::protocol::{ClientMsg, ErrorResponse, ServerMsg};
use tokio::sync::broadcast;

use crate::game_loop::{MatchBroadcast, SessionError};
use crate::http::AppState;

/// Text frames larger than this close the connection
pub const MAX_MESSAGE_BYTES: usize = 1024;
/// Unparseable frames tolerated before the connection is closed
pub const MAX_PARSE_ERRORS: u32 = 5;

/// HTTP handler for WebSocket upgrade
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
) -> impl IntoResponse {
    ws.max_message_size(MAX_MESSAGE_BYTES)
        .on_upgrade(|socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: AppState) {
    let (mut sink, mut stream) = socket.split();

    // Subscribe before reading the current state so no update is missed
    let mut broadcast_rx = app_state.broadcast_tx.subscribe();

    let initial = match app_state.game.state().await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("WebSocket client could not read match state: {}", e);
            return;
        }
    };
    if send_msg(&mut sink, &ServerMsg::State(initial)).await.is_err() {
        return;
    }

    tracing::info!("Spectator connected");
    let mut parse_errors: u32 = 0;

    loop {
        tokio::select! {
            // Client -> Server
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if text.len() > MAX_MESSAGE_BYTES {
                            tracing::warn!("Oversized message ({} bytes), closing", text.len());
                            break;
                        }
                        let client_msg = match serde_json::from_str::<ClientMsg>(&text) {
                            Ok(msg) => msg,
                            Err(e) => {
                                parse_errors += 1;
                                tracing::debug!("Unparseable message: {}", e);
                                if parse_errors >= MAX_PARSE_ERRORS {
                                    tracing::warn!("Too many parse errors, closing");
                                    break;
                                }
                                continue;
                            }
                        };

                        let reply = match apply(&app_state, client_msg).await {
                            Ok(Some(msg)) => msg,
                            Ok(None) => continue,
                            Err(SessionError::Engine(e)) => ServerMsg::Error(ErrorResponse {
                                error: e.to_string(),
                            }),
                            Err(SessionError::Closed) => {
                                tracing::error!("Match task gone, closing WebSocket");
                                break;
                            }
                        };
                        if send_msg(&mut sink, &reply).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {} // Ignore ping/pong/binary
                }
            }

            // Server -> Client (broadcast)
            result = broadcast_rx.recv() => {
                match result {
                    Ok(MatchBroadcast::State(snapshot)) => {
                        if send_msg(&mut sink, &ServerMsg::State(snapshot)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("Spectator lagged by {} updates", n);
                        // Continue - every update is a full snapshot
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::info!("Spectator disconnected");
}

/// Forward one client command. Mutations reach the client through the
/// broadcast, so only a state query gets a direct reply.
async fn apply(app_state: &AppState, msg: ClientMsg) -> Result<Option<ServerMsg>, SessionError> {
    match msg {
        ClientMsg::Tick => app_state.game.tick().await.map(|_| None),
        ClientMsg::Reset => app_state.game.reset().await.map(|_| None),
        ClientMsg::Move { paddle, direction } => app_state
            .game
            .move_paddle(paddle, &direction)
            .await
            .map(|_| None),
        ClientMsg::State => app_state
            .game
            .state()
            .await
            .map(|s| Some(ServerMsg::State(s))),
    }
}

async fn send_msg<S>(sink: &mut S, msg: &ServerMsg) -> Result<(), ()>
where
    S: Sink<Message> + Unpin,
{
    let json = serde_json::to_string(msg).map_err(|_| ())?;
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}
