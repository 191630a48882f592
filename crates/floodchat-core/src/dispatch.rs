//! Outbound dispatcher.
//!
//! Each call spawns an independent task that performs one network call and
//! reports the outcome back to the coordinator as events. Nothing here
//! touches the directory.

use crate::event::Event;
use crate::peer::{ChatMsg, Peer};
use crate::transport::PeerTransport;
use crate::wire;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct Dispatcher {
    self_peer: Peer,
    transport: Arc<dyn PeerTransport>,
    events: mpsc::UnboundedSender<Event>,
}

impl Dispatcher {
    pub fn new(
        self_peer: Peer,
        transport: Arc<dyn PeerTransport>,
        events: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            self_peer,
            transport,
            events,
        }
    }

    /// Announce ourselves to `target` and flood its peer list back in.
    ///
    /// On failure the target is reported unreachable. On success the target
    /// itself and every peer in its reply are offered as joins; unknown ones
    /// get their own announcement from the coordinator.
    pub fn announce_join(&self, target: Peer) {
        let this = self.clone();
        tokio::spawn(async move {
            let body = match this.transport.announce_join(&target, &this.self_peer).await {
                Ok(body) => body,
                Err(e) => {
                    warn!("Join announcement to {} failed: {}", target.address, e);
                    this.emit(Event::PeerUnreachable(target));
                    return;
                }
            };

            let others = wire::decode_peers_lenient(&body);
            debug!(
                "{} answered join with {} peer(s)",
                target.address,
                others.len()
            );

            this.emit(Event::JoinRequested(target));
            for peer in others.into_values() {
                this.emit(Event::JoinRequested(peer));
            }
        });
    }

    /// Send `msg` to `target`, reporting it unreachable on failure.
    pub fn deliver_chat(&self, target: Peer, msg: ChatMsg) {
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.transport.deliver_chat(&target, &msg).await {
                warn!("Chat delivery to {} failed: {}", target.address, e);
                this.emit(Event::PeerUnreachable(target));
            }
        });
    }

    fn emit(&self, event: Event) {
        if let Err(e) = self.events.send(event) {
            debug!("Coordinator gone, dropping {}", e.0.kind());
        }
    }
}
