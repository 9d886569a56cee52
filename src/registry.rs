//! Connection registry
//!
//! Tracks which connections have a display name and enforces the client cap.
//! The registry itself has no locking; `ChatServer` owns it behind the
//! single process-wide mutex, so every method here runs inside a critical section.

use std::collections::HashMap;

use crate::client::Client;
use crate::error::RegisterError;
use crate::types::{ClientId, DisplayName};

/// Live mapping of connections to display names
///
/// Invariants (checked on every insert):
/// - never more than `capacity` entries
/// - no two entries share a display name
#[derive(Debug)]
pub struct Registry {
    clients: HashMap<ClientId, Client>,
    capacity: usize,
}

impl Registry {
    /// Create an empty registry admitting at most `capacity` clients
    pub fn new(capacity: usize) -> Self {
        Self {
            clients: HashMap::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Check whether a new connection may proceed to name negotiation
    ///
    /// Reserves nothing; the slot is only taken by `register`.
    pub fn try_admit(&self) -> bool {
        self.clients.len() < self.capacity
    }

    /// Check whether `name` is free among the active clients
    pub fn claim_name(&self, name: &DisplayName) -> bool {
        !self.clients.values().any(|c| &c.name == name)
    }

    /// Verify `client` can be inserted without breaking an invariant
    ///
    /// Names are re-checked here because another session may have
    /// registered the same name after this one's `claim_name`.
    pub fn check(&self, client: &Client) -> Result<(), RegisterError> {
        if !self.claim_name(&client.name) {
            return Err(RegisterError::NameTaken);
        }
        if !self.try_admit() {
            return Err(RegisterError::ServerFull);
        }
        Ok(())
    }

    /// Insert a client after re-verifying name and capacity
    pub fn register(&mut self, client: Client) -> Result<(), RegisterError> {
        self.check(&client)?;
        self.clients.insert(client.id, client);
        Ok(())
    }

    /// Remove a client; returns the removed entry, None if already gone
    pub fn remove(&mut self, client_id: ClientId) -> Option<Client> {
        self.clients.remove(&client_id)
    }

    /// Iterate registered clients in unspecified order
    pub fn clients(&self) -> impl Iterator<Item = &Client> {
        self.clients.values()
    }

    /// Point-in-time copy of (id, name) pairs
    pub fn snapshot(&self) -> Vec<(ClientId, DisplayName)> {
        self.clients
            .values()
            .map(|c| (c.id, c.name.clone()))
            .collect()
    }
}
