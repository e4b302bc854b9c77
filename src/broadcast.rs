//! Broadcast engine
//!
//! Tracks every open connection and fans encoded frames out to them.
//! Fan-out is best-effort: a failed send is logged and dropped, and the
//! remaining recipients are still served.

use std::collections::HashMap;

use tracing::warn;

use crate::connection::Connection;
use crate::error::SendError;
use crate::types::ConnectionId;

/// All currently open connections: ConnectionId -> Connection
#[derive(Debug, Default)]
pub struct ConnectionSet {
    connections: HashMap<ConnectionId, Connection>,
}

impl ConnectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, connection: Connection) {
        self.connections.insert(connection.id, connection);
    }

    pub fn remove(&mut self, id: ConnectionId) -> Option<Connection> {
        self.connections.remove(&id)
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn get_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Send a frame to one connection
    pub fn send_to(&self, id: ConnectionId, frame: String) -> Result<(), SendError> {
        match self.connections.get(&id) {
            Some(connection) => connection.send(frame),
            None => Err(SendError::ChannelClosed),
        }
    }

    /// Send a frame to every open connection except `exclude`
    ///
    /// Returns how many recipients accepted the frame.
    pub fn broadcast(&self, frame: &str, exclude: Option<ConnectionId>) -> usize {
        let mut delivered = 0;
        for (id, connection) in &self.connections {
            if Some(*id) == exclude || !connection.is_open() {
                continue;
            }
            match connection.send(frame.to_string()) {
                Ok(()) => delivered += 1,
                Err(e) => warn!("Broadcast to {} failed: {}", id, e),
            }
        }
        delivered
    }
}
