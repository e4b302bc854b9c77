//! Server configuration
//!
//! Parsed from command-line flags, falling back to environment variables and
//! then to defaults.

use clap::Parser;

use crate::history::HistoryBuffer;

/// Default listening port
pub const DEFAULT_PORT: u16 = 7070;

/// Frames a connection may have waiting to be written before new ones are dropped
pub const DEFAULT_OUTBOUND_BUFFER: usize = 256;

/// Log filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "chat_relay=info";

#[derive(Debug, Clone, Parser)]
#[command(name = "chat_relay", version, about = "Real-time group chat relay over WebSocket")]
pub struct Config {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Keep only the newest N messages for replay (unbounded if unset)
    #[arg(long, env = "CHAT_RELAY_HISTORY_LIMIT")]
    pub history_limit: Option<usize>,

    /// Per-connection outbound queue size; frames beyond it are dropped for that reader
    #[arg(long, env = "CHAT_RELAY_OUTBOUND_BUFFER", default_value_t = DEFAULT_OUTBOUND_BUFFER)]
    pub outbound_buffer: usize,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,
}

impl Config {
    /// `host:port` for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// An empty history buffer honoring the configured limit
    pub fn history(&self) -> HistoryBuffer {
        match self.history_limit {
            Some(limit) => HistoryBuffer::with_limit(limit),
            None => HistoryBuffer::unbounded(),
        }
    }
}
