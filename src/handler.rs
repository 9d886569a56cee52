//! TCP connection handler
//!
//! Drives one connection through its lifecycle:
//! admission check, name negotiation, backlog replay, read loop, cleanup.
//! Outbound lines go through an mpsc channel to a dedicated writer task,
//! so a line is always written whole by a single task.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::client::Client;
use crate::config::SessionOptions;
use crate::error::{AppError, RegisterError};
use crate::message::{ServerMessage, FALLBACK_BANNER};
use crate::server::ChatServer;
use crate::types::{ClientId, DisplayName};

/// Channel buffer size for outbound messages per connection
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Handle a new TCP connection
///
/// Never touches shared state on failure other than removing this
/// connection's own registry entry.
pub async fn handle_connection(
    mut stream: TcpStream,
    server: ChatServer,
    options: Arc<SessionOptions>,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    if !server.try_admit().await {
        info!("Rejecting {}: server full", peer_addr);
        stream
            .write_all(ServerMessage::ServerFull.render().as_bytes())
            .await?;
        stream.shutdown().await?;
        return Ok(());
    }

    let (reader, writer) = stream.into_split();
    let (msg_tx, msg_rx) = mpsc::channel::<ServerMessage>(CHANNEL_BUFFER_SIZE);
    let write_task = tokio::spawn(write_loop(writer, msg_rx, options.write_timeout));

    let client_id = ClientId::new();
    debug!("Client {} connected from {}", client_id, peer_addr);

    let mut session = Session {
        id: client_id,
        reader: BufReader::new(reader),
        outbox: msg_tx,
        server: server.clone(),
    };

    let banner = load_banner(&options.banner).await;
    if session.send(banner).await {
        if let Some(name) = session.negotiate().await {
            info!("Client {} joined as '{}'", client_id, name);
            session.run().await;
        }
    }

    // Disconnected: drop the registry's sender first so the writer can drain and exit
    server.leave(client_id).await;
    drop(session);
    let _ = write_task.await;

    info!("Client {} disconnected", client_id);

    Ok(())
}

/// Outcome of one registration attempt
#[derive(Debug, PartialEq, Eq)]
enum Attempt {
    Joined,
    /// Ask again with this prompt
    Reprompt(ServerMessage),
    /// Told the server is full; close
    Rejected,
}

/// Per-connection state owned by the session task
struct Session {
    id: ClientId,
    reader: BufReader<OwnedReadHalf>,
    outbox: mpsc::Sender<ServerMessage>,
    server: ChatServer,
}

impl Session {
    /// Queue a line for this connection; false once the writer is gone
    async fn send(&self, msg: ServerMessage) -> bool {
        self.outbox.send(msg).await.is_ok()
    }

    /// Read one line, lossily decoded
    ///
    /// Returns None on EOF, read error, or when the writer task has ended.
    async fn read_line(&mut self) -> Option<String> {
        let mut buf = Vec::new();
        let read = tokio::select! {
            res = self.reader.read_until(b'\n', &mut buf) => res,
            _ = self.outbox.closed() => {
                debug!("Writer for {} ended, closing session", self.id);
                return None;
            }
        };

        match read {
            Ok(0) => None,
            Ok(_) => Some(String::from_utf8_lossy(&buf).into_owned()),
            Err(e) => {
                debug!("Read error for {}: {}", self.id, e);
                None
            }
        }
    }

    /// Prompt until a free name is registered
    ///
    /// Returns None when the connection closes or the server filled up
    /// while the client was choosing a name.
    async fn negotiate(&mut self) -> Option<DisplayName> {
        let mut prompt = ServerMessage::NamePrompt;
        loop {
            if !self.send(prompt).await {
                return None;
            }
            let line = self.read_line().await?;

            let Some(name) = DisplayName::parse(&line) else {
                prompt = ServerMessage::NamePrompt;
                continue;
            };

            if !self.server.claim_name(&name).await {
                prompt = ServerMessage::NameTaken;
                continue;
            }

            match self.try_join(&name).await {
                Attempt::Joined => return Some(name),
                Attempt::Reprompt(msg) => prompt = msg,
                Attempt::Rejected => return None,
            }
        }
    }

    /// Register under `name` after `claim_name` said it was free
    ///
    /// Another session may have taken the name or the last slot since.
    async fn try_join(&self, name: &DisplayName) -> Attempt {
        let client = Client::new(self.id, name.clone(), self.outbox.clone());
        match self.server.join(client).await {
            Ok(_) => Attempt::Joined,
            Err(err @ RegisterError::NameTaken) => Attempt::Reprompt(err.into()),
            Err(err @ RegisterError::ServerFull) => {
                info!("Client {} lost its slot while choosing a name", self.id);
                let _ = self.send(err.into()).await;
                Attempt::Rejected
            }
        }
    }

    /// Active state: every non-blank line becomes a chat message
    async fn run(&mut self) {
        while let Some(line) = self.read_line().await {
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            self.server.broadcast(self.id, text).await;
        }
    }
}

/// Drain the outbound channel into the socket
///
/// Ends on the first write error, on a write exceeding `write_timeout`,
/// or once every sender is dropped.
async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut receiver: mpsc::Receiver<ServerMessage>,
    write_timeout: Duration,
) {
    while let Some(msg) = receiver.recv().await {
        let rendered = msg.render();
        let write = async {
            writer.write_all(rendered.as_bytes()).await?;
            writer.flush().await
        };
        match timeout(write_timeout, write).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!("Write failed: {}", e);
                break;
            }
            Err(_) => {
                warn!("Write timed out after {:?}, dropping connection", write_timeout);
                break;
            }
        }
    }
    let _ = writer.shutdown().await;
}

/// Load the welcome banner, falling back to the built-in text
async fn load_banner(path: &Path) -> ServerMessage {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => ServerMessage::Banner(format!("{}\n", text)),
        Err(e) => {
            debug!("Banner {} unavailable: {}", path.display(), e);
            ServerMessage::Banner(FALLBACK_BANNER.to_string())
        }
    }
}
