//! Group chat relay - Entry Point
//!
//! Starts the TCP listener and ChatServer actor, accepting connections.

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_relay::{serve, ChatServer, Config};

/// Channel buffer size for server commands
const CHANNEL_BUFFER_SIZE: usize = 256;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    // RUST_LOG wins, e.g. RUST_LOG=debug or RUST_LOG=chat_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Chat relay listening on {}", addr);

    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    let server = ChatServer::new(cmd_rx, config.history());
    tokio::spawn(server.run());

    match config.history_limit {
        Some(limit) => info!("ChatServer actor started (history limit {})", limit),
        None => info!("ChatServer actor started (unbounded history)"),
    }

    serve(listener, cmd_tx, config.outbound_buffer).await;

    Ok(())
}
