use pong_shared::config::MatchConfig;
use pong_shared::engine::{Engine, EngineError, TickEvent};
use pong_shared::protocol::StateSnapshot;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Commands from HTTP and WebSocket handlers to the match task
#[derive(Debug)]
pub enum MatchCommand {
    Reset {
        response: oneshot::Sender<StateSnapshot>,
    },
    Tick {
        response: oneshot::Sender<StateSnapshot>,
    },
    Move {
        paddle: i64,
        direction: String,
        response: oneshot::Sender<Result<StateSnapshot, EngineError>>,
    },
    GetState {
        response: oneshot::Sender<StateSnapshot>,
    },
}

/// Broadcasts from the match task to all WebSocket subscribers
#[derive(Debug, Clone)]
pub enum MatchBroadcast {
    State(StateSnapshot),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("match task is not running")]
    Closed,
}

/// Cloneable handle used by request handlers to talk to the match task.
#[derive(Clone)]
pub struct MatchHandle {
    tx: mpsc::Sender<MatchCommand>,
}

impl MatchHandle {
    pub fn new(tx: mpsc::Sender<MatchCommand>) -> Self {
        Self { tx }
    }

    pub async fn reset(&self) -> Result<StateSnapshot, SessionError> {
        self.request(|response| MatchCommand::Reset { response })
            .await
    }

    pub async fn tick(&self) -> Result<StateSnapshot, SessionError> {
        self.request(|response| MatchCommand::Tick { response })
            .await
    }

    pub async fn state(&self) -> Result<StateSnapshot, SessionError> {
        self.request(|response| MatchCommand::GetState { response })
            .await
    }

    /// Move a paddle from raw wire values. Fails with `InvalidInput` if the
    /// paddle is not 1 or 2, or the direction is not "up" or "down".
    pub async fn move_paddle(
        &self,
        paddle: i64,
        direction: &str,
    ) -> Result<StateSnapshot, SessionError> {
        let direction = direction.to_string();
        let result = self
            .request(|response| MatchCommand::Move {
                paddle,
                direction,
                response,
            })
            .await?;
        Ok(result?)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> MatchCommand,
    ) -> Result<T, SessionError> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(build(resp_tx))
            .await
            .map_err(|_| SessionError::Closed)?;
        resp_rx.await.map_err(|_| SessionError::Closed)
    }
}

/// Run the match task. Owns the engine; commands are applied strictly one at
/// a time in arrival order.
pub async fn run_match_loop(
    mut cmd_rx: mpsc::Receiver<MatchCommand>,
    broadcast_tx: broadcast::Sender<MatchBroadcast>,
    match_config: MatchConfig,
) {
    let mut engine = Engine::new(match_config);
    let mut tick_count: u64 = 0;

    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            MatchCommand::Reset { response } => {
                engine.reset();
                tick_count = 0;
                tracing::info!("Match reset");
                let snapshot = StateSnapshot::from_state(engine.state());
                let _ = broadcast_tx.send(MatchBroadcast::State(snapshot.clone()));
                let _ = response.send(snapshot);
            }
            MatchCommand::Tick { response } => {
                let was_over = engine.state().is_over();
                let events = engine.advance_one_tick();
                if !was_over {
                    tick_count += 1;
                }
                log_events(&engine, tick_count, &events);
                let snapshot = StateSnapshot::from_state(engine.state());
                let _ = broadcast_tx.send(MatchBroadcast::State(snapshot.clone()));
                let _ = response.send(snapshot);
            }
            MatchCommand::Move {
                paddle,
                direction,
                response,
            } => match engine.apply_move(paddle, &direction) {
                Ok(moved) => {
                    if moved {
                        tracing::trace!("Paddle {} moved {}", paddle, direction);
                    }
                    let snapshot = StateSnapshot::from_state(engine.state());
                    let _ = broadcast_tx.send(MatchBroadcast::State(snapshot.clone()));
                    let _ = response.send(Ok(snapshot));
                }
                Err(e) => {
                    tracing::debug!("Rejected move: {}", e);
                    let _ = response.send(Err(e));
                }
            },
            MatchCommand::GetState { response } => {
                let _ = response.send(StateSnapshot::from_state(engine.state()));
            }
        }
    }

    tracing::info!("Match loop ended");
}

fn log_events(engine: &Engine, tick: u64, events: &[TickEvent]) {
    for event in events {
        match event {
            TickEvent::WallBounce => tracing::debug!("Tick {}: wall bounce", tick),
            TickEvent::PaddleHit(side) => {
                tracing::debug!("Tick {}: paddle {} hit", tick, side.paddle_number())
            }
            TickEvent::Scored(side) => {
                let score = engine.state().score;
                tracing::info!(
                    "Tick {}: player{} scored ({}-{})",
                    tick,
                    side.paddle_number(),
                    score.left,
                    score.right
                );
            }
            TickEvent::MatchOver(side) => {
                tracing::info!("Tick {}: player{} wins", tick, side.paddle_number())
            }
        }
    }
}

/// Spawn the match task and return a handle to it plus the broadcast sender
/// subscribers attach to.
pub fn spawn_match(
    match_config: MatchConfig,
    command_buffer: usize,
    broadcast_buffer: usize,
) -> (MatchHandle, broadcast::Sender<MatchBroadcast>) {
    let (cmd_tx, cmd_rx) = mpsc::channel::<MatchCommand>(command_buffer);
    let (broadcast_tx, _) = broadcast::channel::<MatchBroadcast>(broadcast_buffer);

    let bc_tx = broadcast_tx.clone();
    tokio::spawn(async move {
        run_match_loop(cmd_rx, bc_tx, match_config).await;
    });

    (MatchHandle::new(cmd_tx), broadcast_tx)
}
