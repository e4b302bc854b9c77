//! ChatServer Actor implementation
//!
//! The central actor that owns all shared state: open connections, the user
//! registry and the message history. Handlers talk to it through an mpsc
//! channel, so every registration, message and disconnect is processed one at
//! a time and observes a consistent view of the state.

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::broadcast::ConnectionSet;
use crate::connection::Connection;
use crate::error::ValidationError;
use crate::history::{ChatMessage, HistoryBuffer};
use crate::message::{encode, ServerMessage};
use crate::registry::{Identity, UserRegistry};
use crate::types::{non_blank_text, ConnectionId, IdentityId};

/// Commands sent from handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New connection accepted
    ///
    /// The participant and history replay comes back on `replay`, so it is
    /// never subject to the bound on `sender`.
    Connect {
        connection_id: ConnectionId,
        sender: mpsc::Sender<String>,
        replay: oneshot::Sender<Vec<String>>,
    },
    /// Connection closed
    Disconnect { connection_id: ConnectionId },
    /// `newUser` request
    NewUser {
        connection_id: ConnectionId,
        candidate: Value,
    },
    /// `message` request
    Message {
        connection_id: ConnectionId,
        body: Value,
        user_id: Option<Value>,
    },
}

/// The main ChatServer actor
pub struct ChatServer {
    /// All open connections
    connections: ConnectionSet,
    /// Active identities
    registry: UserRegistry,
    /// Accepted messages
    history: HistoryBuffer,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a new ChatServer with the given command receiver and history
    pub fn new(receiver: mpsc::Receiver<ServerCommand>, history: HistoryBuffer) -> Self {
        Self {
            connections: ConnectionSet::new(),
            registry: UserRegistry::new(),
            history,
            receiver,
        }
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect {
                connection_id,
                sender,
                replay,
            } => self.handle_connect(connection_id, sender, replay),
            ServerCommand::Disconnect { connection_id } => self.handle_disconnect(connection_id),
            ServerCommand::NewUser {
                connection_id,
                candidate,
            } => self.handle_new_user(connection_id, candidate),
            ServerCommand::Message {
                connection_id,
                body,
                user_id,
            } => self.handle_message(connection_id, body, user_id),
        }
    }

    /// Handle new connection: snapshot participants, then history, for it alone
    ///
    /// Anything broadcast after this command is queued behind the snapshot.
    fn handle_connect(
        &mut self,
        connection_id: ConnectionId,
        sender: mpsc::Sender<String>,
        replay: oneshot::Sender<Vec<String>>,
    ) {
        info!("Connection {} opened", connection_id);
        self.connections.insert(Connection::new(connection_id, sender));

        let participants = self
            .registry
            .list_all()
            .iter()
            .map(|identity| ServerMessage::UserCame(identity.display_name.clone()));
        let messages = self.history.list_all().cloned().map(ServerMessage::Message);
        let frames: Vec<String> = participants
            .chain(messages)
            .filter_map(|msg| Self::frame(&msg))
            .collect();

        debug!(
            "Replaying {} frames to {}; total connections: {}",
            frames.len(),
            connection_id,
            self.connections.len()
        );
        if replay.send(frames).is_err() {
            warn!("Replay to {} failed: handler gone", connection_id);
        }
    }

    /// Handle connection close
    fn handle_disconnect(&mut self, connection_id: ConnectionId) {
        self.connections.remove(connection_id);

        match self.registry.remove(connection_id) {
            Some(identity) => {
                info!(
                    "Connection {} closed, '{}' left",
                    connection_id, identity.display_name
                );
                self.broadcast(&ServerMessage::UserGone(identity.display_name), None);
            }
            None => {
                info!("Connection {} closed before registering", connection_id);
            }
        }

        debug!(
            "Total connections: {}, registered users: {}",
            self.connections.len(),
            self.registry.len()
        );
    }

    /// Handle `newUser`
    fn handle_new_user(&mut self, connection_id: ConnectionId, candidate: Value) {
        if self.connections.get(connection_id).is_none() {
            return;
        }

        let identity = match self.registry.register(&candidate, connection_id) {
            Ok(identity) => identity,
            Err(e) => {
                warn!("Registration rejected for {}: {}", connection_id, e);
                self.reply(connection_id, &e.into());
                return;
            }
        };

        if let Some(connection) = self.connections.get_mut(connection_id) {
            connection.register(identity.id);
        }
        info!(
            "Connection {} registered as '{}'",
            connection_id, identity.display_name
        );

        self.reply(
            connection_id,
            &ServerMessage::UserId {
                username: identity.display_name.clone(),
                id: identity.id,
            },
        );
        self.broadcast(
            &ServerMessage::UserCame(identity.display_name),
            Some(connection_id),
        );
    }

    /// Handle `message`: validate, record, echo to everyone
    fn handle_message(&mut self, connection_id: ConnectionId, body: Value, user_id: Option<Value>) {
        if self.connections.get(connection_id).is_none() {
            return;
        }

        let body = match non_blank_text(&body) {
            Ok(text) => text.to_string(),
            Err(rejection) => {
                let err = ValidationError::from(rejection);
                warn!("Message rejected from {}: {}", connection_id, err);
                self.reply(connection_id, &err.into());
                return;
            }
        };

        let Some(sender) = self.resolve_sender(connection_id, user_id.as_ref()) else {
            debug!("Dropping message from unregistered connection {}", connection_id);
            return;
        };

        let message = ChatMessage::new(sender.display_name.clone(), body);
        debug!("'{}' sent message {}", message.display_name, message.id.0);

        let envelope = ServerMessage::Message(message.clone());
        self.history.append(message);
        self.broadcast(&envelope, None);
    }

    /// The identity bound to this connection, else the one the client declared
    fn resolve_sender(&self, connection_id: ConnectionId, user_id: Option<&Value>) -> Option<&Identity> {
        self.registry.lookup_by_connection(connection_id).or_else(|| {
            user_id
                .and_then(IdentityId::from_declared)
                .and_then(|id| self.registry.lookup_by_id(id))
        })
    }

    /// Helper: Encode and send an envelope to one connection
    fn reply(&self, connection_id: ConnectionId, msg: &ServerMessage) {
        let Some(frame) = Self::frame(msg) else {
            return;
        };
        if let Err(e) = self.connections.send_to(connection_id, frame) {
            warn!("Reply to {} failed: {}", connection_id, e);
        }
    }

    /// Helper: Encode once and fan out
    fn broadcast(&self, msg: &ServerMessage, exclude: Option<ConnectionId>) {
        let Some(frame) = Self::frame(msg) else {
            return;
        };
        let delivered = self.connections.broadcast(&frame, exclude);
        debug!("Broadcast delivered to {} connections", delivered);
    }

    fn frame(msg: &ServerMessage) -> Option<String> {
        match encode(msg) {
            Ok(frame) => Some(frame),
            Err(e) => {
                error!("Failed to serialize message: {}", e);
                None
            }
        }
    }
}
