//! Basic type definitions for the chat relay
//!
//! Provides newtype wrappers for type safety:
//! - `ConnectionId`: UUID-based handle for one transport connection
//! - `IdentityId`: UUID-based token issued on registration
//! - `MessageId`: UUID-based token issued for each accepted message
//!
//! Also hosts the non-blank text rule shared by display names and message bodies.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Opaque handle for a transport connection
///
/// Never sent over the wire; only used as a key inside the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token assigned to an identity on successful registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct IdentityId(pub Uuid);

impl IdentityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse the `userId` a client declared on a request
    ///
    /// Anything that is not a UUID string does not resolve.
    pub fn from_declared(value: &Value) -> Option<Self> {
        value
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(Self)
    }
}

impl Default for IdentityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for IdentityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token assigned to every accepted chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a piece of client text was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRejection {
    NotAString,
    Blank,
}

/// Accept a JSON value only if it is a string with at least one
/// non-whitespace character. The text is returned untrimmed.
pub fn non_blank_text(value: &Value) -> Result<&str, TextRejection> {
    let Some(text) = value.as_str() else {
        return Err(TextRejection::NotAString);
    };
    if text.trim().is_empty() {
        return Err(TextRejection::Blank);
    }
    Ok(text)
}
