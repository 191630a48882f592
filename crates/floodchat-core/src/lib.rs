//! floodchat-core: membership and chat fan-out for a flood-join P2P chat.
//!
//! This crate provides:
//! - The peer directory and wire types (`Peer`, `ChatMsg`, `Peers`)
//! - The coordinator actor that owns the directory and serializes all
//!   membership changes
//! - The outbound dispatcher that runs join announcements and chat
//!   deliveries as independent tasks
//! - The `PeerTransport` trait the network layer implements

pub mod coordinator;
pub mod directory;
pub mod dispatch;
pub mod event;
pub mod peer;
pub mod transport;
pub mod wire;

pub use coordinator::{Coordinator, CoordinatorError, CoordinatorHandle};
pub use directory::{JoinOutcome, PeerDirectory};
pub use dispatch::Dispatcher;
pub use event::{Event, Notice};
pub use peer::{ChatMsg, Peer, Peers};
pub use transport::{PeerTransport, TransportError};
