//! Broadcaster
//!
//! Fans a single log entry out to every registered client. Callers hold
//! the `ChatServer` lock for the whole fan-out, which is what gives every
//! recipient the same message order.

use tracing::debug;

use crate::message::ServerMessage;
use crate::registry::Registry;
use crate::types::ClientId;

/// Outcome of one fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOut {
    /// Sends attempted, one per recipient
    pub attempted: usize,
    /// Sends that failed because the recipient's writer is gone
    pub failed: usize,
}

impl FanOut {
    pub fn delivered(&self) -> usize {
        self.attempted - self.failed
    }
}

/// Deliver a chat line to every registered client
///
/// `sender` gets the self-styled copy, everyone else the peer-styled one.
/// A failed send is counted and skipped; the recipient's own session
/// notices the broken connection and cleans up.
pub async fn broadcast(registry: &Registry, line: &str, sender: ClientId) -> FanOut {
    let mut report = FanOut::default();
    for client in registry.clients() {
        let msg = if client.id == sender {
            ServerMessage::Own(line.to_string())
        } else {
            ServerMessage::Peer(line.to_string())
        };
        report.attempted += 1;
        if let Err(e) = client.send(msg).await {
            debug!("Dropping message for {}: {}", client.id, e);
            report.failed += 1;
        }
    }
    report
}

/// Deliver a join/leave notice, skipping `exclude` if given
pub async fn announce(registry: &Registry, line: &str, exclude: Option<ClientId>) -> FanOut {
    let mut report = FanOut::default();
    for client in registry.clients().filter(|c| Some(c.id) != exclude) {
        report.attempted += 1;
        if let Err(e) = client
            .send(ServerMessage::Announcement(line.to_string()))
            .await
        {
            debug!("Dropping announcement for {}: {}", client.id, e);
            report.failed += 1;
        }
    }
    report
}
