use pong_shared::config::MatchConfig;

/// Environment variable that overrides the listen address
pub const LISTEN_ADDR_ENV: &str = "PONG_LISTEN_ADDR";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Pending commands queued for the match task
    pub command_buffer: usize,
    /// State updates buffered per WebSocket subscriber
    pub broadcast_buffer: usize,
    pub match_config: MatchConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5001".to_string(),
            command_buffer: 256,
            broadcast_buffer: 64,
            match_config: MatchConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults, with the listen address taken from the environment when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(addr) = std::env::var(LISTEN_ADDR_ENV) {
            config.listen_addr = addr;
        }
        config
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.trim().is_empty() {
            return Err("listen_addr must not be empty".to_string());
        }
        if self.command_buffer == 0 {
            return Err("command_buffer must be > 0".to_string());
        }
        if self.broadcast_buffer == 0 {
            return Err("broadcast_buffer must be > 0".to_string());
        }
        self.match_config
            .validate()
            .map_err(|e| format!("match_config: {}", e))
    }
}
