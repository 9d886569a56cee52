//! Connection acceptor
//!
//! Accepts TCP connections forever and spawns one session task per connection.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{debug, error};

use crate::config::SessionOptions;
use crate::handler::handle_connection;
use crate::server::ChatServer;

/// Accept loop
///
/// Accept errors are logged and skipped; session errors stay inside
/// the spawned task.
pub async fn serve(listener: TcpListener, server: ChatServer, options: SessionOptions) {
    let options = Arc::new(options);

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                debug!("New connection from {}", addr);
                let server = server.clone();
                let options = Arc::clone(&options);

                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, server, options).await {
                        error!("Connection handler error for {}: {}", addr, e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
