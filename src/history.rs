//! History buffer
//!
//! Append-only log of accepted chat messages, replayed to every new connection.

use std::collections::VecDeque;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::types::MessageId;

/// One accepted chat message
///
/// Serializes as the `data` of an outbound `message` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    /// Sender's display name at the time of sending
    #[serde(rename = "username")]
    pub display_name: String,
    #[serde(rename = "message")]
    pub body: String,
    #[serde(rename = "messageId")]
    pub id: MessageId,
    #[serde(rename = "date", serialize_with = "serialize_date")]
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Stamp a new message with a fresh id and the current time
    pub fn new(display_name: String, body: String) -> Self {
        Self {
            display_name,
            body,
            id: MessageId::new(),
            timestamp: Utc::now(),
        }
    }
}

/// `2024-05-01T10:00:00.123Z`
fn serialize_date<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Ordered in-memory message log
///
/// Unbounded unless a limit is given, in which case the oldest
/// messages are evicted first.
#[derive(Debug, Default)]
pub struct HistoryBuffer {
    messages: VecDeque<ChatMessage>,
    limit: Option<usize>,
}

impl HistoryBuffer {
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Keep at most `limit` of the newest messages
    pub fn with_limit(limit: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(limit),
            limit: Some(limit),
        }
    }

    pub fn append(&mut self, message: ChatMessage) {
        if let Some(limit) = self.limit {
            if limit == 0 {
                return;
            }
            while self.messages.len() >= limit {
                self.messages.pop_front();
            }
        }
        self.messages.push_back(message);
    }

    /// Messages in acceptance order
    pub fn list_all(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
