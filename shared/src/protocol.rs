use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::engine::{MatchState, Side};

// === Match state ===

/// Wire name of a paddle's owner. Side 1 is left, side 2 is right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PlayerSlot {
    Player1,
    Player2,
}

impl From<Side> for PlayerSlot {
    fn from(side: Side) -> Self {
        match side {
            Side::Left => PlayerSlot::Player1,
            Side::Right => PlayerSlot::Player2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StateSnapshot {
    pub ball: BallWire,
    pub paddle1: PaddleWire,
    pub paddle2: PaddleWire,
    pub scores: ScoresWire,
    pub game_over: bool,
    pub winner: Option<PlayerSlot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BallWire {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaddleWire {
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScoresWire {
    pub player1: u32,
    pub player2: u32,
}

impl StateSnapshot {
    pub fn from_state(state: &MatchState) -> Self {
        Self {
            ball: BallWire {
                x: state.ball.x,
                y: state.ball.y,
            },
            paddle1: PaddleWire {
                y: state.paddle_left.y,
            },
            paddle2: PaddleWire {
                y: state.paddle_right.y,
            },
            scores: ScoresWire {
                player1: state.score.left,
                player2: state.score.right,
            },
            game_over: state.is_over(),
            winner: state.winner.map(PlayerSlot::from),
        }
    }
}

// === HTTP bodies ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MoveRequest {
    #[serde(default)]
    #[ts(type = "number | null")]
    pub paddle: Option<i64>,
    #[serde(default)]
    pub direction: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewPlayer {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreatedPlayer {
    pub id: u32,
    pub name: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerWire {
    pub id: u32,
    pub name: String,
    /// Unix seconds
    #[ts(type = "number")]
    pub created_at: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewGame {
    #[serde(default)]
    pub player1_id: Option<u32>,
    #[serde(default)]
    pub player2_id: Option<u32>,
    #[serde(default)]
    pub player1_score: u32,
    #[serde(default)]
    pub player2_score: u32,
    #[serde(default)]
    pub winner_id: Option<u32>,
    /// Seconds, as reported by the client
    #[serde(default)]
    #[ts(type = "number")]
    pub game_duration: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SavedGame {
    pub id: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameWire {
    pub id: u32,
    pub player1_score: u32,
    pub player2_score: u32,
    pub winner_id: Option<u32>,
    #[ts(type = "number")]
    pub game_duration: u64,
    #[ts(type = "number")]
    pub created_at: u64,
    pub player1_name: Option<String>,
    pub player2_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeaderboardEntry {
    pub name: String,
    pub wins: u32,
}

// === WebSocket: Server -> Client ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type")]
pub enum ServerMsg {
    #[serde(rename = "state")]
    State(StateSnapshot),
    #[serde(rename = "error")]
    Error(ErrorResponse),
}

// === WebSocket: Client -> Server ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type")]
pub enum ClientMsg {
    #[serde(rename = "tick")]
    Tick,
    #[serde(rename = "move")]
    Move {
        #[ts(type = "number")]
        paddle: i64,
        direction: String,
    },
    #[serde(rename = "reset")]
    Reset,
    #[serde(rename = "state")]
    State,
}
