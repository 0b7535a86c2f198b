//! Authoritative match simulation.
//!
//! The engine is a plain state machine: it never sleeps, never does I/O and
//! never draws random numbers. Callers are expected to serialize access to it
//! (the server wraps it in a single owning task).

use crate::config::MatchConfig;
use thiserror::Error;

/// Which paddle. Wire numbering is 1 = left, 2 = right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn from_paddle_number(n: i64) -> Option<Self> {
        match n {
            1 => Some(Side::Left),
            2 => Some(Side::Right),
            _ => None,
        }
    }

    pub fn paddle_number(self) -> u8 {
        match self {
            Side::Left => 1,
            Side::Right => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Playing,
    Over,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Paddle number or direction outside the accepted set.
    #[error("invalid paddle {paddle} or direction {direction:?}")]
    InvalidInput { paddle: i64, direction: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ball {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paddle {
    /// Top edge
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Score {
    pub left: u32,
    pub right: u32,
}

/// Full state of one match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchState {
    pub ball: Ball,
    pub paddle_left: Paddle,
    pub paddle_right: Paddle,
    pub score: Score,
    pub phase: Phase,
    pub winner: Option<Side>,
}

impl MatchState {
    /// Canonical kickoff state for the given geometry.
    pub fn new(config: &MatchConfig) -> Self {
        let paddle_y = config.paddle_start_y();
        Self {
            ball: Ball {
                x: config.canvas_width / 2.0,
                y: config.canvas_height / 2.0,
                vx: config.serve_vx,
                vy: config.serve_vy,
            },
            paddle_left: Paddle { y: paddle_y },
            paddle_right: Paddle { y: paddle_y },
            score: Score::default(),
            phase: Phase::Playing,
            winner: None,
        }
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::Over
    }

    pub fn paddle(&self, side: Side) -> &Paddle {
        match side {
            Side::Left => &self.paddle_left,
            Side::Right => &self.paddle_right,
        }
    }

    fn paddle_mut(&mut self, side: Side) -> &mut Paddle {
        match side {
            Side::Left => &mut self.paddle_left,
            Side::Right => &mut self.paddle_right,
        }
    }
}

/// Something that happened during a tick, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEvent {
    WallBounce,
    PaddleHit(Side),
    /// The given side won the point.
    Scored(Side),
    MatchOver(Side),
}

/// Owns one match and applies commands to it.
#[derive(Debug, Clone)]
pub struct Engine {
    config: MatchConfig,
    state: MatchState,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(MatchConfig::default())
    }
}

impl Engine {
    pub fn new(config: MatchConfig) -> Self {
        let state = MatchState::new(&config);
        Self { config, state }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Replace the match with a fresh kickoff state.
    pub fn reset(&mut self) -> &MatchState {
        self.state = MatchState::new(&self.config);
        &self.state
    }

    /// Advance the ball by one tick. Does nothing once the match is over.
    pub fn advance_one_tick(&mut self) -> Vec<TickEvent> {
        let mut events = Vec::new();
        if self.state.is_over() {
            return events;
        }

        let cfg = &self.config;
        let state = &mut self.state;

        state.ball.x += state.ball.vx;
        state.ball.y += state.ball.vy;

        // No clamp: the ball may sit past the wall line for this tick.
        if state.ball.y <= cfg.ball_radius || state.ball.y >= cfg.canvas_height - cfg.ball_radius
        {
            state.ball.vy = -state.ball.vy;
            events.push(TickEvent::WallBounce);
        }

        // Left is checked before right; both always run.
        let left_face = cfg.paddle_offset + cfg.paddle_width;
        if state.ball.vx < 0.0 && state.ball.x <= left_face {
            if let Some(spin) = paddle_spin(cfg, state.paddle_left.y, state.ball.y) {
                state.ball.vx = -state.ball.vx;
                state.ball.vy += spin;
                events.push(TickEvent::PaddleHit(Side::Left));
            }
        }

        let right_face = cfg.canvas_width - cfg.paddle_offset - cfg.paddle_width;
        if state.ball.vx > 0.0 && state.ball.x >= right_face {
            if let Some(spin) = paddle_spin(cfg, state.paddle_right.y, state.ball.y) {
                state.ball.vx = -state.ball.vx;
                state.ball.vy += spin;
                events.push(TickEvent::PaddleHit(Side::Right));
            }
        }

        let scorer = if state.ball.x < 0.0 {
            Some(Side::Right)
        } else if state.ball.x > cfg.canvas_width {
            Some(Side::Left)
        } else {
            None
        };
        if let Some(side) = scorer {
            match side {
                Side::Left => state.score.left += 1,
                Side::Right => state.score.right += 1,
            }
            serve_after_score(cfg, &mut state.ball);
            events.push(TickEvent::Scored(side));
        }

        let winner = if state.score.left >= cfg.winning_score {
            Some(Side::Left)
        } else if state.score.right >= cfg.winning_score {
            Some(Side::Right)
        } else {
            None
        };
        if let Some(side) = winner {
            state.phase = Phase::Over;
            state.winner = Some(side);
            events.push(TickEvent::MatchOver(side));
        }

        events
    }

    /// Move a paddle one step. A step that would leave the legal range is
    /// skipped entirely. Returns whether the paddle moved.
    pub fn move_paddle(&mut self, side: Side, direction: Direction) -> bool {
        let speed = self.config.paddle_speed;
        let max_y = self.config.paddle_max_y();
        let paddle = self.state.paddle_mut(side);
        let next = match direction {
            Direction::Up => paddle.y - speed,
            Direction::Down => paddle.y + speed,
        };
        if next < 0.0 || next > max_y {
            return false;
        }
        paddle.y = next;
        true
    }

    /// Move a paddle from raw wire values (`1`/`2`, `"up"`/`"down"`).
    pub fn apply_move(&mut self, paddle: i64, direction: &str) -> Result<bool, EngineError> {
        match (Side::from_paddle_number(paddle), Direction::parse(direction)) {
            (Some(side), Some(dir)) => Ok(self.move_paddle(side, dir)),
            _ => Err(EngineError::InvalidInput {
                paddle,
                direction: direction.to_string(),
            }),
        }
    }
}

/// Vertical velocity change for a ball at `ball_y` hitting a paddle whose top
/// edge is `paddle_y`, or `None` if the ball is outside the paddle's span.
fn paddle_spin(cfg: &MatchConfig, paddle_y: f64, ball_y: f64) -> Option<f64> {
    if ball_y < paddle_y || ball_y > paddle_y + cfg.paddle_height {
        return None;
    }
    let hit_pos = (ball_y - paddle_y) / cfg.paddle_height;
    Some((hit_pos - 0.5) * cfg.spin_factor)
}

/// Re-center the ball and send it back toward the side that just scored.
/// Spin is dropped.
fn serve_after_score(cfg: &MatchConfig, ball: &mut Ball) {
    ball.x = cfg.canvas_width / 2.0;
    ball.y = cfg.canvas_height / 2.0;
    ball.vx = -ball.vx;
    ball.vy = cfg.serve_vy;
}
