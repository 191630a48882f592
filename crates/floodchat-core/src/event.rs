//! Events consumed by the coordinator and notices it emits.

use crate::peer::{ChatMsg, Peer, Peers};
use std::fmt;
use tokio::sync::oneshot;

/// Input to the coordinator loop.
///
/// Every producer (gateway handlers, outbound tasks, the input reader)
/// talks to the coordinator only through these.
#[derive(Debug)]
pub enum Event {
    /// A peer should be added (and announced to) unless already known
    JoinRequested(Peer),
    /// Reply with a copy of the current directory
    PeerListRequested(oneshot::Sender<Peers>),
    /// An outbound call to this peer failed
    PeerUnreachable(Peer),
    /// Chat arrived from a remote peer
    MessageReceived(ChatMsg),
    /// The local user typed a line
    UserMessageSubmitted(ChatMsg),
    /// Stop the loop
    Shutdown,
}

impl Event {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::JoinRequested(_) => "JoinRequested",
            Event::PeerListRequested(_) => "PeerListRequested",
            Event::PeerUnreachable(_) => "PeerUnreachable",
            Event::MessageReceived(_) => "MessageReceived",
            Event::UserMessageSubmitted(_) => "UserMessageSubmitted",
            Event::Shutdown => "Shutdown",
        }
    }
}

/// User-facing output from the coordinator.
///
/// `Display` renders the console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The node is up
    Listening(Peer),
    /// A new peer entered the directory
    Connected(Peer),
    /// A peer left the directory after a failed call
    Disconnected(Peer),
    /// Chat from a remote peer
    Received(ChatMsg),
    /// Chat typed locally
    Sent(ChatMsg),
}

impl Notice {
    /// Whether this notice belongs on the console.
    ///
    /// Departures are only logged.
    pub fn is_console(&self) -> bool {
        !matches!(self, Notice::Disconnected(_))
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Listening(peer) => {
                write!(f, "# \"{}\" listening on {}", peer.name, peer.address)
            }
            Notice::Connected(peer) => write!(f, "# Connected to: {}", peer.address),
            Notice::Disconnected(peer) => write!(f, "# Lost: {}", peer.address),
            Notice::Received(msg) => write!(f, "{} writes: {}", msg.from.name, msg.message),
            Notice::Sent(msg) => write!(f, "{} (self) says: {}", msg.from.name, msg.message),
        }
    }
}
