//! Client struct definition
//!
//! Represents a registered client: its identity, display name and the
//! channel feeding its connection's writer task.

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::{ClientId, DisplayName};

/// Registered client information
///
/// The sender is a reference to the connection, not the connection
/// itself: the socket stays owned by the session and its writer task.
#[derive(Debug, Clone)]
pub struct Client {
    /// Unique identifier for this connection
    pub id: ClientId,
    /// Name negotiated before registration
    pub name: DisplayName,
    /// Server → Client message channel
    pub sender: mpsc::Sender<ServerMessage>,
}

impl Client {
    /// Create a new client with the given ID, name and sender channel
    pub fn new(id: ClientId, name: DisplayName, sender: mpsc::Sender<ServerMessage>) -> Self {
        Self { id, name, sender }
    }

    /// Send a message to this client
    ///
    /// Returns an error if the channel is closed (client disconnected).
    pub async fn send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender
            .send(msg)
            .await
            .map_err(|_| SendError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(raw: &str) -> DisplayName {
        DisplayName::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_client_send() {
        let (tx, mut rx) = mpsc::channel(32);
        let client = Client::new(ClientId::new(), name("alice"), tx);

        client.send(ServerMessage::NamePrompt).await.unwrap();
        assert_eq!(rx.recv().await, Some(ServerMessage::NamePrompt));
    }

    #[tokio::test]
    async fn test_client_send_after_disconnect() {
        let (tx, rx) = mpsc::channel(32);
        let client = Client::new(ClientId::new(), name("alice"), tx);
        drop(rx);

        let result = client.send(ServerMessage::NamePrompt).await;
        assert!(matches!(result, Err(SendError::ChannelClosed)));
    }
}
