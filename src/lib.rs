//! Group Chat Relay Library
//!
//! A WebSocket chat relay built with tokio-tungstenite: clients register a
//! display name and every accepted message is broadcast to all connections.
//!
//! # Features
//! - Display name registration (non-blank, unique among active users)
//! - Replay of current participants and message history on connect
//! - Message fan-out to every connection, sender included
//! - Join / leave announcements
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the central actor owning the registry, history and connection set
//! - Each connection has a `handler` task that decodes frames and forwards commands
//! - Each connection's outbound queue is bounded; a reader that falls behind loses frames
//! - No locks needed - all state access goes through message passing
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use chat_relay::{serve, ChatServer, HistoryBuffer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:7070").await.unwrap();
//!     let (cmd_tx, cmd_rx) = mpsc::channel(256);
//!
//!     tokio::spawn(ChatServer::new(cmd_rx, HistoryBuffer::unbounded()).run());
//!     serve(listener, cmd_tx, 256).await;
//! }
//! ```

pub mod broadcast;
pub mod config;
pub mod connection;
pub mod error;
pub mod handler;
pub mod history;
pub mod message;
pub mod registry;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use broadcast::ConnectionSet;
pub use config::Config;
pub use connection::{Connection, SessionState};
pub use error::{AppError, DecodeError, RegistrationError, SendError, ValidationError};
pub use handler::{handle_connection, serve};
pub use history::{ChatMessage, HistoryBuffer};
pub use message::{decode, encode, ClientMessage, ServerMessage};
pub use registry::{Identity, UserRegistry};
pub use server::{ChatServer, ServerCommand};
pub use types::{ConnectionId, IdentityId, MessageId};
