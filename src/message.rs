//! Message protocol definitions
//!
//! JSON envelope codec `{ "type": ..., "data": ... }` using Serde's tagged enums
//! for type-safe serialization/deserialization.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, DecodeError, RegistrationError, ValidationError};
use crate::history::ChatMessage;
use crate::types::IdentityId;

/// Client → Server message
///
/// Payloads stay as raw JSON: each handler validates its own fields.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Register a display name
    NewUser {
        #[serde(default)]
        data: Value,
    },
    /// Send a chat message
    Message {
        #[serde(default)]
        data: Value,
        #[serde(rename = "userId", default)]
        user_id: Option<Value>,
    },
    /// Any other type; ignored
    #[serde(other)]
    Unknown,
}

/// Server → Client message
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Registration accepted
    UserId { username: String, id: IdentityId },
    /// Someone registered
    UserCame(String),
    /// A registered user disconnected
    UserGone(String),
    /// Chat message (live or replayed)
    Message(ChatMessage),
    /// Malformed frame or invalid message body
    Error(String),
    /// Registration rejected
    UsernameError(String),
}

impl From<DecodeError> for ServerMessage {
    fn from(err: DecodeError) -> Self {
        ServerMessage::Error(err.to_string())
    }
}

impl From<ValidationError> for ServerMessage {
    fn from(err: ValidationError) -> Self {
        ServerMessage::Error(err.to_string())
    }
}

impl From<RegistrationError> for ServerMessage {
    fn from(err: RegistrationError) -> Self {
        ServerMessage::UsernameError(err.to_string())
    }
}

/// Encode an envelope into a text frame
pub fn encode(msg: &ServerMessage) -> Result<String, AppError> {
    Ok(serde_json::to_string(msg)?)
}

/// Decode a text frame
///
/// Only text that is not JSON at all is an error. JSON that does not look
/// like a known envelope decodes to `ClientMessage::Unknown`.
pub fn decode(text: &str) -> Result<ClientMessage, DecodeError> {
    let value: Value = serde_json::from_str(text)?;
    if !value.get("type").is_some_and(Value::is_string) {
        return Ok(ClientMessage::Unknown);
    }
    Ok(ClientMessage::deserialize(value).unwrap_or(ClientMessage::Unknown))
}
