//! Message protocol definitions
//!
//! Line-based server → client vocabulary. Every outbound line is a
//! `ServerMessage`; the delivery role (history, own, peer, announcement)
//! is picked at fan-out time and only affects the ANSI decoration,
//! never the stored text.

use chrono::{DateTime, Local};

use crate::error::RegisterError;
use crate::types::DisplayName;

const COLOR_RESET: &str = "\x1b[0m";
const COLOR_RED: &str = "\x1b[31m";
const COLOR_GREEN: &str = "\x1b[32m";
const COLOR_YELLOW: &str = "\x1b[33m";
const COLOR_BLUE: &str = "\x1b[34m";

/// Shown when no banner file is available; the regular prompt still follows
pub const FALLBACK_BANNER: &str = "Welcome to TCP-Chat!\n[ENTER YOUR NAME]: ";

/// Timestamp layout used in chat lines
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const NAME_PROMPT: &str = "\n[ENTER YOUR NAME]: ";

/// Server → Client message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Welcome text sent verbatim once before the first name prompt
    Banner(String),
    /// Ask for a display name
    NamePrompt,
    /// Requested name is held by another client
    NameTaken,
    /// Capacity reached, connection will be closed
    ServerFull,
    /// Backlog entry replayed on join
    History(String),
    /// Live message authored by the receiving client
    Own(String),
    /// Live message authored by someone else
    Peer(String),
    /// Join or leave notice
    Announcement(String),
}

impl ServerMessage {
    /// Render the exact bytes written to the socket
    pub fn render(&self) -> String {
        match self {
            ServerMessage::Banner(text) => text.clone(),
            ServerMessage::NamePrompt => NAME_PROMPT.to_string(),
            ServerMessage::NameTaken => {
                format!("Name already taken. Choose another name:{}", NAME_PROMPT)
            }
            ServerMessage::ServerFull => "Server full. Try again later.\n".to_string(),
            ServerMessage::History(line) => decorate(COLOR_RED, line),
            ServerMessage::Own(line) => decorate(COLOR_GREEN, line),
            ServerMessage::Peer(line) => decorate(COLOR_BLUE, line),
            ServerMessage::Announcement(line) => decorate(COLOR_YELLOW, line),
        }
    }
}

fn decorate(color: &str, line: &str) -> String {
    format!("{}{}{}\n", color, line, COLOR_RESET)
}

/// Convert a registration failure into the line the client sees
impl From<RegisterError> for ServerMessage {
    fn from(err: RegisterError) -> Self {
        match err {
            RegisterError::NameTaken => ServerMessage::NameTaken,
            RegisterError::ServerFull => ServerMessage::ServerFull,
        }
    }
}

/// Format a chat line as `[timestamp][name]:text`
pub fn format_chat_line(at: DateTime<Local>, name: &DisplayName, text: &str) -> String {
    format!("[{}][{}]:{}", at.format(TIMESTAMP_FORMAT), name, text)
}

pub fn join_notice(name: &DisplayName) -> String {
    format!("{} has joined our chat...", name)
}

pub fn leave_notice(name: &DisplayName) -> String {
    format!("{} has left our chat...", name)
}
