//! Message log
//!
//! Ordered backlog of formatted chat lines and join/leave notices,
//! replayed to every newly registered client.

use std::collections::VecDeque;

/// Append-only chat history
///
/// With a limit of 0 the log grows for the lifetime of the process.
/// Otherwise the oldest entries are dropped once `limit` is reached;
/// order of the retained entries is unchanged.
#[derive(Debug, Default)]
pub struct MessageLog {
    entries: VecDeque<String>,
    limit: usize,
}

impl MessageLog {
    /// Create an empty log; `limit == 0` means unbounded
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit,
        }
    }

    /// Append an entry at the tail
    pub fn append(&mut self, entry: String) {
        if self.limit > 0 && self.entries.len() == self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Stored entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
