//! Peer identity and chat message types.
//!
//! Field names are PascalCase on the wire (`Name`, `Address`, `Message`,
//! `From`). Lowercase names are accepted on input.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A participant in the chat network.
///
/// The address (`host:port`) is the identity; names are free-form and may
/// collide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Peer {
    /// Display name
    #[serde(default, alias = "name")]
    pub name: String,
    /// Network address used as the unique key
    #[serde(default, alias = "address")]
    pub address: String,
}

impl Peer {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    /// A peer known only by address, as given to `--join`.
    pub fn unnamed(address: impl Into<String>) -> Self {
        Self::new(String::new(), address)
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.address)
        } else {
            write!(f, "{} ({})", self.name, self.address)
        }
    }
}

/// Directory snapshot: address → peer.
pub type Peers = HashMap<String, Peer>;

/// A chat line together with the peer that wrote it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChatMsg {
    #[serde(default, alias = "message")]
    pub message: String,
    #[serde(default, alias = "from")]
    pub from: Peer,
}

impl ChatMsg {
    pub fn new(message: impl Into<String>, from: Peer) -> Self {
        Self {
            message: message.into(),
            from,
        }
    }
}
