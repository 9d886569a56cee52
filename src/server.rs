//! ChatServer shared state
//!
//! Holds the registry and the message log behind one `tokio::sync::Mutex`.
//! Each public operation is a single critical section:
//! - admit check
//! - name claim
//! - register + backlog replay + join notice
//! - append + fan-out of a chat line
//! - remove + leave notice
//!
//! Fan-out happens while the lock is held, so any two messages reach every
//! common recipient in log order, and a replay can never race an append.
//! The cost is that a stalled recipient delays every broadcast until its
//! writer times out.

use std::sync::Arc;

use chrono::Local;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::broadcast::{self, FanOut};
use crate::client::Client;
use crate::error::RegisterError;
use crate::history::MessageLog;
use crate::message::{self, ServerMessage};
use crate::registry::Registry;
use crate::types::{ClientId, DisplayName};

/// State guarded by the server lock
#[derive(Debug)]
struct ChatState {
    registry: Registry,
    log: MessageLog,
}

impl ChatState {
    /// Append a notice to the log and deliver it
    async fn announce(&mut self, line: String, exclude: Option<ClientId>) -> FanOut {
        let report = broadcast::announce(&self.registry, &line, exclude).await;
        self.log.append(line);
        report
    }
}

/// Handle to the shared chat state
///
/// Cheap to clone; every clone refers to the same registry and log.
/// Created once in `main` and handed to the acceptor.
#[derive(Debug, Clone)]
pub struct ChatServer {
    state: Arc<Mutex<ChatState>>,
}

impl ChatServer {
    /// Create a server admitting `max_clients` clients and keeping
    /// `history_limit` log entries (0 = unbounded)
    pub fn new(max_clients: usize, history_limit: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(ChatState {
                registry: Registry::new(max_clients),
                log: MessageLog::new(history_limit),
            })),
        }
    }

    /// Whether a fresh connection may start name negotiation
    pub async fn try_admit(&self) -> bool {
        self.state.lock().await.registry.try_admit()
    }

    /// Whether `name` is currently free
    ///
    /// Advisory only: `join` checks again before inserting.
    pub async fn claim_name(&self, name: &DisplayName) -> bool {
        self.state.lock().await.registry.claim_name(name)
    }

    /// Register a client, replay the backlog to it and announce the join
    ///
    /// The join notice goes to everyone else and into the log after the
    /// replay snapshot, so the new client never sees its own join line.
    /// On error nothing is replayed and the registry is unchanged.
    pub async fn join(&self, client: Client) -> Result<FanOut, RegisterError> {
        let mut state = self.state.lock().await;
        state.registry.check(&client)?;

        for entry in state.log.entries() {
            if client
                .send(ServerMessage::History(entry.to_string()))
                .await
                .is_err()
            {
                debug!("Backlog replay to {} cut short", client.id);
                break;
            }
        }

        let id = client.id;
        let notice = message::join_notice(&client.name);
        state.registry.register(client)?;
        info!(
            "Client {} registered ({}/{})",
            id,
            state.registry.len(),
            state.registry.capacity()
        );

        Ok(state.announce(notice, Some(id)).await)
    }

    /// Stamp, log and fan out a chat line from `sender`
    ///
    /// Returns None when `sender` is not registered.
    pub async fn broadcast(&self, sender: ClientId, text: &str) -> Option<FanOut> {
        let mut state = self.state.lock().await;
        let name = state
            .registry
            .clients()
            .find(|c| c.id == sender)
            .map(|c| c.name.clone())?;

        let line = message::format_chat_line(Local::now(), &name, text);
        let report = broadcast::broadcast(&state.registry, &line, sender).await;
        state.log.append(line);

        debug!(
            "Message from {} delivered to {}/{}",
            sender,
            report.delivered(),
            report.attempted
        );
        Some(report)
    }

    /// Remove a client and announce its departure to the rest
    ///
    /// Idempotent; returns None if the client was not registered.
    pub async fn leave(&self, client_id: ClientId) -> Option<FanOut> {
        let mut state = self.state.lock().await;
        let client = state.registry.remove(client_id)?;
        info!(
            "Client {} ({}) left, {} remaining",
            client_id,
            client.name,
            state.registry.len()
        );

        let notice = message::leave_notice(&client.name);
        Some(state.announce(notice, Some(client_id)).await)
    }

    /// Point-in-time copy of the registry
    pub async fn snapshot(&self) -> Vec<(ClientId, DisplayName)> {
        self.state.lock().await.registry.snapshot()
    }

    /// Number of registered clients
    pub async fn client_count(&self) -> usize {
        self.state.lock().await.registry.len()
    }

    /// Copy of the message log, oldest first
    pub async fn history(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .log
            .entries()
            .map(str::to_string)
            .collect()
    }
}
