mod config;
mod network;
mod player;
mod state;

use config::ServerConfig;
use network::send_to_player;
use pickaxe_protocol_core::InternalPacket;
use state::ServerState;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// A connection stays alive if it acknowledges a keep-alive within this many
/// seconds of it being sent (§4.8).
const KEEP_ALIVE_TIMEOUT_SECS: u64 = 30;
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load(Path::new("config/server.toml"))?;
    let filter = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    info!("Starting Pickaxe server...");
    let config = Arc::new(config);

    let mut world = pickaxe_world::World::new("world");
    if let Some(path) = &config.server.world.schematic {
        info!("Loading schematic from {}", path.display());
        let data = std::fs::read(path)?;
        pickaxe_world::schematic::load_into(&mut world, &data)?;
        info!("Loaded schematic ({} chunks populated)", world.chunk_count());
    }

    let server = Arc::new(ServerState::new(config.clone(), world));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    let ticker_server = server.clone();
    let ticker = tokio::spawn(async move { run_keep_alive_ticker(ticker_server).await });

    tokio::select! {
        _ = accept_loop(listener, server.clone()) => {
            error!("Accept loop exited unexpectedly");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    ticker.abort();
    shutdown(&server).await;
    Ok(())
}

async fn accept_loop(listener: TcpListener, server: Arc<ServerState>) {
    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                info!("New connection from {}", peer);
                let server = server.clone();
                tokio::spawn(async move {
                    network::handle_connection(socket, server).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

/// Every second: time out players that never acknowledged their last
/// keep-alive, and send a fresh one to everybody else, per §4.8.
async fn run_keep_alive_ticker(server: Arc<ServerState>) {
    let mut interval = tokio::time::interval(KEEP_ALIVE_INTERVAL);
    loop {
        interval.tick().await;
        for player in server.players.all().await {
            if player.keep_alive.is_pending() {
                if player.keep_alive.seconds_since_send().await >= KEEP_ALIVE_TIMEOUT_SECS {
                    warn!("{} timed out", player.profile.name);
                    let _ = send_to_player(
                        &player,
                        &InternalPacket::Disconnect {
                            reason_json: r#"{"text":"Timed out"}"#.into(),
                        },
                    )
                    .await;
                    server.players.remove(&player.profile.uuid).await;
                    player.spawn_close_after_grace_delay();
                }
                continue;
            }
            let id = rand::random::<i32>();
            if send_to_player(&player, &InternalPacket::KeepAliveOut { id: id as i64 })
                .await
                .is_ok()
            {
                player.keep_alive.stamp_sent(id).await;
            }
        }
    }
}

async fn shutdown(server: &Arc<ServerState>) {
    let mut closes = Vec::new();
    for player in server.players.all().await {
        let _ = send_to_player(
            &player,
            &InternalPacket::Disconnect {
                reason_json: r#"{"text":"Server is shutting down"}"#.into(),
            },
        )
        .await;
        closes.push(player.spawn_close_after_grace_delay());
    }
    for close in closes {
        let _ = close.await;
    }
    info!("Server shut down cleanly");
}
