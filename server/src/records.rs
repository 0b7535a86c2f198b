//! Player registry, match history and leaderboard.
//!
//! Held in memory for the lifetime of the process.

use pong_shared::protocol::{GameWire, LeaderboardEntry, NewGame, PlayerWire};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("Name is required")]
    NameRequired,
    #[error("Player name already exists")]
    DuplicateName,
}

#[derive(Debug, Clone)]
struct PlayerRecord {
    id: u32,
    name: String,
    created_at: u64,
}

#[derive(Debug, Clone)]
struct GameRecord {
    id: u32,
    game: NewGame,
    created_at: u64,
}

pub struct RecordStore {
    players: HashMap<u32, PlayerRecord>,
    games: Vec<GameRecord>,
    next_player_id: u32,
    next_game_id: u32,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    pub fn new() -> Self {
        Self {
            players: HashMap::new(),
            games: Vec::new(),
            next_player_id: 1,
            next_game_id: 1,
        }
    }

    /// Register a player under a unique name.
    pub fn create_player(&mut self, name: &str) -> Result<PlayerWire, RecordError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RecordError::NameRequired);
        }
        if self.players.values().any(|p| p.name == name) {
            return Err(RecordError::DuplicateName);
        }

        let record = PlayerRecord {
            id: self.next_player_id,
            name: name.to_string(),
            created_at: unix_now(),
        };
        self.next_player_id += 1;
        let wire = to_player_wire(&record);
        self.players.insert(record.id, record);
        Ok(wire)
    }

    /// All players, ordered by name.
    pub fn players(&self) -> Vec<PlayerWire> {
        let mut players: Vec<PlayerWire> = self.players.values().map(to_player_wire).collect();
        players.sort_by(|a, b| a.name.cmp(&b.name));
        players
    }

    pub fn save_game(&mut self, game: NewGame) -> u32 {
        let id = self.next_game_id;
        self.next_game_id += 1;
        self.games.push(GameRecord {
            id,
            game,
            created_at: unix_now(),
        });
        id
    }

    /// Match history, newest first. Unknown player ids resolve to no name.
    pub fn games(&self) -> Vec<GameWire> {
        self.games
            .iter()
            .rev()
            .map(|record| GameWire {
                id: record.id,
                player1_score: record.game.player1_score,
                player2_score: record.game.player2_score,
                winner_id: record.game.winner_id,
                game_duration: record.game.game_duration,
                created_at: record.created_at,
                player1_name: self.player_name(record.game.player1_id),
                player2_name: self.player_name(record.game.player2_id),
            })
            .collect()
    }

    /// Every registered player with their win count, most wins first and
    /// ties broken by name.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut wins: HashMap<u32, u32> = HashMap::new();
        for record in &self.games {
            if let Some(winner) = record.game.winner_id {
                *wins.entry(winner).or_insert(0) += 1;
            }
        }

        let mut entries: Vec<LeaderboardEntry> = self
            .players
            .values()
            .map(|p| LeaderboardEntry {
                name: p.name.clone(),
                wins: *wins.get(&p.id).unwrap_or(&0),
            })
            .collect();
        entries.sort_by(|a, b| b.wins.cmp(&a.wins).then_with(|| a.name.cmp(&b.name)));
        entries
    }

    fn player_name(&self, id: Option<u32>) -> Option<String> {
        id.and_then(|id| self.players.get(&id))
            .map(|p| p.name.clone())
    }
}

fn to_player_wire(record: &PlayerRecord) -> PlayerWire {
    PlayerWire {
        id: record.id,
        name: record.name.clone(),
        created_at: record.created_at,
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
