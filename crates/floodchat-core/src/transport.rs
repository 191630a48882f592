//! PeerTransport trait for outbound peer calls.
//!
//! Implementations:
//! - HTTP: reqwest client in floodchat-daemon
//! - In-memory fakes in tests

use crate::peer::{ChatMsg, Peer};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Peer answered with status {status}")]
    Status { status: u16 },

    #[error("Transport error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Network side of the outbound dispatcher.
///
/// Any `Err` is treated as the target being unreachable.
#[async_trait]
pub trait PeerTransport: Send + Sync + 'static {
    /// Announce `joiner` to `target` and return the raw response body
    /// (expected to be a JSON peer list).
    async fn announce_join(&self, target: &Peer, joiner: &Peer) -> Result<Vec<u8>>;

    /// Deliver a chat message to `target`.
    async fn deliver_chat(&self, target: &Peer, msg: &ChatMsg) -> Result<()>;
}
