//! JSON encoding for the `/join` and `/chat` bodies.
//!
//! Encoding cannot fail for these plain structs. Request bodies are decoded
//! strictly and the gateway decides what a failure means. Join responses are
//! decoded leniently: garbage reads as an empty peer list.

use crate::peer::{ChatMsg, Peer, Peers};
use serde::Serialize;
use tracing::debug;

/// Path of the join endpoint.
pub const JOIN_PATH: &str = "/join";

/// Path of the chat endpoint.
pub const CHAT_PATH: &str = "/chat";

/// Serialize to JSON bytes.
pub fn encode<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("wire types always serialize")
}

pub fn decode_peer(data: &[u8]) -> serde_json::Result<Peer> {
    serde_json::from_slice(data)
}

pub fn decode_chat(data: &[u8]) -> serde_json::Result<ChatMsg> {
    serde_json::from_slice(data)
}

pub fn decode_peers(data: &[u8]) -> serde_json::Result<Peers> {
    serde_json::from_slice(data)
}

/// Parse a join response body, tolerating garbage as an empty list.
pub fn decode_peers_lenient(data: &[u8]) -> Peers {
    decode_peers(data).unwrap_or_else(|e| {
        debug!("Undecodable peer list ({} bytes): {}", data.len(), e);
        Peers::new()
    })
}
