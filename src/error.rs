//! Error types for the chat relay
//!
//! Defines fatal per-connection errors, the user-facing errors that are
//! reported back to a single client, and message send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::types::TextRejection;

/// Application-level errors
///
/// All of these end the affected connection only; the process keeps serving.
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization error on an outbound envelope
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send error (the server actor is gone)
    #[error("Channel send error")]
    ChannelSend,
}

/// Inbound frame is not well-formed JSON
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid JSON")]
    InvalidJson(#[from] serde_json::Error),
}

/// Rejected `newUser` request
///
/// The display text is what the client sees in `usernameError`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("Username must be a string")]
    NotAString,

    #[error("Username must not be empty")]
    Blank,

    #[error("A user with this name already exists")]
    NameTaken(String),

    #[error("You are already registered as {0}")]
    AlreadyRegistered(String),
}

impl From<TextRejection> for RegistrationError {
    fn from(rejection: TextRejection) -> Self {
        match rejection {
            TextRejection::NotAString => Self::NotAString,
            TextRejection::Blank => Self::Blank,
        }
    }
}

/// Rejected `message` body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Message must be a string")]
    NotAString,

    #[error("Message must not be empty")]
    Blank,
}

impl From<TextRejection> for ValidationError {
    fn from(rejection: TextRejection) -> Self {
        match rejection {
            TextRejection::NotAString => Self::NotAString,
            TextRejection::Blank => Self::Blank,
        }
    }
}

/// Message send errors
///
/// Occurs when a recipient's frame queue is closed or full.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,

    /// The recipient is not keeping up; the frame was dropped
    #[error("Channel full")]
    Full,
}
