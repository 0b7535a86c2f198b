use pong_server::config::ServerConfig;
use pong_server::game_loop::spawn_match;
use pong_server::http::{router, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env();

    // Validate configuration before starting
    if let Err(e) = config.validate() {
        eprintln!("Invalid server configuration: {}", e);
        std::process::exit(1);
    }

    let (game, broadcast_tx) = spawn_match(
        config.match_config,
        config.command_buffer,
        config.broadcast_buffer,
    );
    let app = router(AppState::new(game, broadcast_tx));

    let listener = match tokio::net::TcpListener::bind(&config.listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", config.listen_addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting pong server on {}", config.listen_addr);
    println!("Pong server listening on {}", config.listen_addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
