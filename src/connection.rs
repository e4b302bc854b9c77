//! Connection struct definition
//!
//! Represents one live transport connection as seen by the server actor:
//! its id, its outbound frame queue, and where it is in the session lifecycle.

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::error::SendError;
use crate::types::{ConnectionId, IdentityId};

/// Session lifecycle of a connection
///
/// A closed connection is removed from the server's connection set, so
/// `Closed` is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepted, no identity yet
    Connected,
    /// Identity bound
    Registered(IdentityId),
}

/// Connected client information
#[derive(Debug)]
pub struct Connection {
    /// Unique identifier for this connection
    pub id: ConnectionId,
    /// Server → Client frame queue (bounded)
    pub sender: mpsc::Sender<String>,
    /// Current session state
    pub state: SessionState,
}

impl Connection {
    /// Create a new connection in the `Connected` state
    pub fn new(id: ConnectionId, sender: mpsc::Sender<String>) -> Self {
        Self {
            id,
            sender,
            state: SessionState::Connected,
        }
    }

    /// Queue an encoded frame for this connection
    ///
    /// Never waits: a full queue drops the frame and reports `SendError::Full`.
    pub fn send(&self, frame: String) -> Result<(), SendError> {
        self.sender.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => SendError::Full,
            TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }

    /// Bind an identity to this connection
    pub fn register(&mut self, identity: IdentityId) {
        self.state = SessionState::Registered(identity);
    }

    pub fn is_registered(&self) -> bool {
        matches!(self.state, SessionState::Registered(_))
    }

    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }
}
