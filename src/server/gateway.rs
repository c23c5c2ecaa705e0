//! Broadcast gateway.
//!
//! Wraps the per-connection outbound channels. Delivery is fire-and-forget:
//! a recipient whose writer task is gone is skipped without error.

use std::collections::HashMap;

use tokio::sync::mpsc;

use crate::protocol::ServerMessage;

use super::registry::ConnectionId;

pub type Outbound = mpsc::UnboundedSender<ServerMessage>;

#[derive(Debug, Default)]
pub struct Gateway {
    peers: HashMap<ConnectionId, Outbound>,
}

impl Gateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, id: ConnectionId, sender: Outbound) {
        self.peers.insert(id, sender);
    }

    pub fn detach(&mut self, id: ConnectionId) {
        self.peers.remove(&id);
    }

    /// Send a message to one connection.
    pub fn send_to(&self, id: ConnectionId, msg: ServerMessage) {
        if let Some(sender) = self.peers.get(&id) {
            if sender.send(msg).is_err() {
                tracing::trace!(connection = %id, "Dropped message for closed connection");
            }
        }
    }

    /// Send a message to every connection.
    pub fn broadcast(&self, msg: ServerMessage) {
        for (id, sender) in &self.peers {
            if sender.send(msg.clone()).is_err() {
                tracing::trace!(connection = %id, "Dropped broadcast for closed connection");
            }
        }
    }
}
