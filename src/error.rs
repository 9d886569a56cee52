//! Error types for the chat server
//!
//! Defines application-level errors, message send errors and the
//! expected outcomes of name registration.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// `Bind` is fatal for the whole process. `Io` only ends the session
/// it happened in.
#[derive(Debug, Error)]
pub enum AppError {
    /// Listening socket could not be bound (fatal)
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error on a single connection
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Message send errors
///
/// Occurs when attempting to send messages through closed channels.
#[derive(Debug, Error)]
pub enum SendError {
    /// The connection's writer task has ended
    #[error("Channel closed")]
    ChannelClosed,
}

/// Reasons a negotiated name could not be registered
///
/// Both are user-facing conditions, not failures of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegisterError {
    /// Another active connection already holds the name
    #[error("Name already taken")]
    NameTaken,

    /// The registry is at capacity
    #[error("Server full")]
    ServerFull,
}
