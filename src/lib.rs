//! Multi-client TCP Chat Server Library
//!
//! Clients connect over plain TCP, pick a unique display name and exchange
//! newline-delimited messages broadcast to everyone connected. New clients
//! get the chat backlog replayed before any live traffic.
//!
//! # Architecture
//! - `ChatServer` owns the registry and message log behind one mutex
//! - Each connection runs a session task plus a writer task fed by `mpsc`
//! - Append and fan-out of a message happen under the same lock hold,
//!   so all clients see messages in the same order
//!
//! # Example
//! ```ignore
//! use clap::Parser;
//! use tokio::net::TcpListener;
//! use tcp_chat::{serve, ChatServer, Config};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::parse();
//!     let listener = TcpListener::bind(config.listen_addr()).await.unwrap();
//!     let server = ChatServer::new(config.max_clients, config.history_limit);
//!     serve(listener, server, config.session_options()).await;
//! }
//! ```

pub mod broadcast;
pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod history;
pub mod listener;
pub mod message;
pub mod registry;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use broadcast::FanOut;
pub use client::Client;
pub use config::{Config, SessionOptions, DEFAULT_PORT};
pub use error::{AppError, RegisterError, SendError};
pub use handler::handle_connection;
pub use history::MessageLog;
pub use listener::serve;
pub use message::ServerMessage;
pub use registry::Registry;
pub use server::ChatServer;
pub use types::{ClientId, DisplayName};
