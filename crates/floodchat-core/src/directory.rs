//! Peer directory: the set of known remote peers keyed by address.
//!
//! Owned exclusively by the coordinator, so there is no interior locking.
//! Our own identity is held alongside the map and never inserted into it.

use crate::peer::{Peer, Peers};

/// Outcome of offering a peer to the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Newly inserted
    Added,
    /// Address belongs to us
    IsSelf,
    /// Address already present
    AlreadyKnown,
}

#[derive(Debug, Clone)]
pub struct PeerDirectory {
    self_peer: Peer,
    peers: Peers,
}

impl PeerDirectory {
    pub fn new(self_peer: Peer) -> Self {
        Self {
            self_peer,
            peers: Peers::new(),
        }
    }

    /// Our own identity.
    pub fn self_peer(&self) -> &Peer {
        &self.self_peer
    }

    /// True for our own address or any address already in the directory.
    pub fn is_known(&self, peer: &Peer) -> bool {
        peer.address == self.self_peer.address || self.peers.contains_key(&peer.address)
    }

    /// Insert `peer` unless it is us or already present.
    ///
    /// An existing entry is never overwritten, so a later join carrying a
    /// different name for the same address is ignored.
    pub fn join(&mut self, peer: Peer) -> JoinOutcome {
        if self.is_known(&peer) {
            return if peer.address == self.self_peer.address {
                JoinOutcome::IsSelf
            } else {
                JoinOutcome::AlreadyKnown
            };
        }
        self.peers.insert(peer.address.clone(), peer);
        JoinOutcome::Added
    }

    /// Remove the entry for `address`, if any.
    pub fn remove(&mut self, address: &str) -> Option<Peer> {
        self.peers.remove(address)
    }

    /// Owned copy of the current mapping.
    pub fn snapshot(&self) -> Peers {
        self.peers.clone()
    }

    pub fn peers(&self) -> impl Iterator<Item = &Peer> {
        self.peers.values()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
