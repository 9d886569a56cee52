//! TCP Chat Server - Entry Point
//!
//! Parses configuration, binds the listener and runs the accept loop.

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tcp_chat::{serve, AppError, ChatServer, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=tcp_chat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tcp_chat=info")),
        )
        .init();

    // Prints usage and exits on bad arguments
    let config = Config::parse();

    let addr = config.listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| AppError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    info!("Listening on the port :{}", config.port);

    let server = ChatServer::new(config.max_clients, config.history_limit);
    info!(
        "Accepting up to {} clients, banner {}",
        config.max_clients,
        config.banner.display()
    );

    serve(listener, server, config.session_options()).await;

    Ok(())
}
