//! JSON routes under `/api`.
//!
//! Handlers carry no game logic: match commands go to the match task via
//! [`MatchHandle`], records go to the shared [`RecordStore`].

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use pong_shared::protocol::{
    CreatedPlayer, ErrorResponse, GameWire, LeaderboardEntry, MessageResponse, MoveRequest,
    NewGame, NewPlayer, PlayerWire, SavedGame, StateSnapshot,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tower_http::cors::CorsLayer;

use crate::game_loop::{MatchBroadcast, MatchHandle, SessionError};
use crate::records::{RecordError, RecordStore};
use crate::ws::ws_handler;

/// Shared app state passed to every handler
#[derive(Clone)]
pub struct AppState {
    pub game: MatchHandle,
    pub broadcast_tx: broadcast::Sender<MatchBroadcast>,
    pub records: Arc<RwLock<RecordStore>>,
}

impl AppState {
    pub fn new(game: MatchHandle, broadcast_tx: broadcast::Sender<MatchBroadcast>) -> Self {
        Self {
            game,
            broadcast_tx,
            records: Arc::new(RwLock::new(RecordStore::new())),
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid paddle or direction")]
    InvalidMove,
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error("{0}")]
    BadRequest(String),
    #[error("Game is not available")]
    Unavailable,
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Engine(_) => ApiError::InvalidMove,
            SessionError::Closed => ApiError::Unavailable,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_REQUEST,
        };
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the full router: API routes, WebSocket endpoint and CORS.
pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/game/state", get(get_state))
        .route("/api/game/reset", post(reset_game))
        .route("/api/game/update", post(update_game))
        .route("/api/game/move", post(move_paddle))
        .route("/api/players", post(create_player).get(list_players))
        .route("/api/games", post(save_game).get(list_games))
        .route("/api/leaderboard", get(leaderboard))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

pub async fn get_state(State(app): State<AppState>) -> Result<Json<StateSnapshot>, ApiError> {
    Ok(Json(app.game.state().await?))
}

pub async fn reset_game(State(app): State<AppState>) -> Result<Json<StateSnapshot>, ApiError> {
    Ok(Json(app.game.reset().await?))
}

pub async fn update_game(State(app): State<AppState>) -> Result<Json<StateSnapshot>, ApiError> {
    Ok(Json(app.game.tick().await?))
}

pub async fn move_paddle(
    State(app): State<AppState>,
    body: Result<Json<MoveRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    // A body of the wrong shape is reported like any other bad move.
    let Ok(Json(req)) = body else {
        return Err(ApiError::InvalidMove);
    };
    let (Some(paddle), Some(direction)) = (req.paddle, req.direction) else {
        return Err(ApiError::InvalidMove);
    };

    app.game.move_paddle(paddle, &direction).await?;
    Ok(Json(MessageResponse {
        message: "Paddle moved successfully".to_string(),
    }))
}

pub async fn create_player(
    State(app): State<AppState>,
    body: Result<Json<NewPlayer>, JsonRejection>,
) -> Result<Json<CreatedPlayer>, ApiError> {
    let Json(req) = body?;
    let name = req.name.unwrap_or_default();

    let player = app.records.write().await.create_player(&name)?;
    tracing::info!("Player {} registered as {:?}", player.id, player.name);
    Ok(Json(CreatedPlayer {
        id: player.id,
        name: player.name,
        message: "Player created successfully".to_string(),
    }))
}

pub async fn list_players(State(app): State<AppState>) -> Json<Vec<PlayerWire>> {
    Json(app.records.read().await.players())
}

pub async fn save_game(
    State(app): State<AppState>,
    body: Result<Json<NewGame>, JsonRejection>,
) -> Result<Json<SavedGame>, ApiError> {
    let Json(game) = body?;
    let id = app.records.write().await.save_game(game);
    tracing::info!("Saved game {}", id);
    Ok(Json(SavedGame {
        id,
        message: "Game saved successfully".to_string(),
    }))
}

pub async fn list_games(State(app): State<AppState>) -> Json<Vec<GameWire>> {
    Json(app.records.read().await.games())
}

pub async fn leaderboard(State(app): State<AppState>) -> Json<Vec<LeaderboardEntry>> {
    Json(app.records.read().await.leaderboard())
}
