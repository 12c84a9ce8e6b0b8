//! Lobby Arena Server
//!
//! Binary entry point: logging, configuration from the environment, then
//! the WebSocket gateway until Ctrl-C.

use tracing::info;
use tracing_subscriber::EnvFilter;

use lobby_arena::{GameServer, ServerConfig, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env();
    info!("Lobby Arena Server v{}", VERSION);
    info!(
        "Tick Rate: {} Hz, world {}x{}",
        config.game.tick_rate, config.game.world_width, config.game.world_height
    );

    let server = GameServer::new(config);

    let signal_server = server.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_server.shutdown();
        }
    });

    server.run().await?;
    info!("Server stopped");
    Ok(())
}
