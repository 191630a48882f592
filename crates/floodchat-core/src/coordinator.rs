//! Coordinator: the single owner of the peer directory.
//!
//! All membership changes happen inside `Coordinator::run`, one event at a
//! time. Other components hold a `CoordinatorHandle` and only ever send
//! events or await replies.

use crate::directory::{JoinOutcome, PeerDirectory};
use crate::dispatch::Dispatcher;
use crate::event::{Event, Notice};
use crate::peer::{ChatMsg, Peer, Peers};
use crate::transport::PeerTransport;
use std::ops::ControlFlow;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("Coordinator has stopped")]
    Stopped,
}

pub type Result<T> = std::result::Result<T, CoordinatorError>;

/// Cheap, cloneable sender side of the coordinator.
#[derive(Clone, Debug)]
pub struct CoordinatorHandle {
    self_peer: Peer,
    events: mpsc::UnboundedSender<Event>,
}

impl CoordinatorHandle {
    /// Our own identity.
    pub fn self_peer(&self) -> &Peer {
        &self.self_peer
    }

    /// Queue a raw event.
    pub fn send(&self, event: Event) -> Result<()> {
        self.events.send(event).map_err(|_| CoordinatorError::Stopped)
    }

    /// Offer a peer for membership.
    pub fn join(&self, peer: Peer) -> Result<()> {
        self.send(Event::JoinRequested(peer))
    }

    /// Snapshot of the directory as of when this request is processed.
    pub async fn peers(&self) -> Result<Peers> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::PeerListRequested(tx))?;
        rx.await.map_err(|_| CoordinatorError::Stopped)
    }

    pub fn peer_unreachable(&self, peer: Peer) -> Result<()> {
        self.send(Event::PeerUnreachable(peer))
    }

    /// Hand over chat received from a remote peer.
    pub fn message_received(&self, msg: ChatMsg) -> Result<()> {
        self.send(Event::MessageReceived(msg))
    }

    /// Broadcast a locally typed line to every known peer.
    pub fn submit(&self, line: impl Into<String>) -> Result<()> {
        let msg = ChatMsg::new(line, self.self_peer.clone());
        self.send(Event::UserMessageSubmitted(msg))
    }

    /// Ask the loop to stop after the events already queued.
    pub fn shutdown(&self) -> Result<()> {
        self.send(Event::Shutdown)
    }
}

pub struct Coordinator {
    directory: PeerDirectory,
    dispatcher: Dispatcher,
    events: mpsc::UnboundedReceiver<Event>,
    notices: mpsc::UnboundedSender<Notice>,
}

impl Coordinator {
    /// Create a coordinator for `self_peer`.
    ///
    /// Returns the coordinator (not yet running), a handle for producers,
    /// and the receiver for console notices.
    pub fn new(
        self_peer: Peer,
        transport: Arc<dyn PeerTransport>,
    ) -> (Self, CoordinatorHandle, mpsc::UnboundedReceiver<Notice>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();

        let dispatcher = Dispatcher::new(self_peer.clone(), transport, event_tx.clone());
        let handle = CoordinatorHandle {
            self_peer: self_peer.clone(),
            events: event_tx,
        };
        let coordinator = Self {
            directory: PeerDirectory::new(self_peer),
            dispatcher,
            events: event_rx,
            notices: notice_tx,
        };

        (coordinator, handle, notice_rx)
    }

    /// Run on a new task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process events until `Shutdown`.
    pub async fn run(mut self) {
        self.notify(Notice::Listening(self.directory.self_peer().clone()));

        while let Some(event) = self.events.recv().await {
            if self.handle_event(event).is_break() {
                break;
            }
        }

        info!("Coordinator stopped with {} known peer(s)", self.directory.len());
    }

    fn handle_event(&mut self, event: Event) -> ControlFlow<()> {
        debug!("Handling {}", event.kind());

        match event {
            Event::JoinRequested(peer) => self.on_join_requested(peer),
            Event::PeerListRequested(reply) => {
                // Requester may have given up; nothing to do then
                let _ = reply.send(self.directory.snapshot());
            }
            Event::PeerUnreachable(peer) => self.on_peer_unreachable(peer),
            Event::MessageReceived(msg) => self.notify(Notice::Received(msg)),
            Event::UserMessageSubmitted(msg) => self.on_user_message(msg),
            Event::Shutdown => return ControlFlow::Break(()),
        }

        ControlFlow::Continue(())
    }

    fn on_join_requested(&mut self, peer: Peer) {
        match self.directory.join(peer.clone()) {
            JoinOutcome::Added => {
                info!("Peer joined: {}", peer);
                self.notify(Notice::Connected(peer.clone()));
                self.dispatcher.announce_join(peer);
            }
            JoinOutcome::IsSelf | JoinOutcome::AlreadyKnown => {
                debug!("Ignoring join for known address {}", peer.address);
            }
        }
    }

    fn on_peer_unreachable(&mut self, peer: Peer) {
        if let Some(removed) = self.directory.remove(&peer.address) {
            info!("Peer unreachable, removed: {}", removed);
            self.notify(Notice::Disconnected(removed));
        }
    }

    fn on_user_message(&mut self, msg: ChatMsg) {
        self.notify(Notice::Sent(msg.clone()));

        for peer in self.directory.peers() {
            self.dispatcher.deliver_chat(peer.clone(), msg.clone());
        }
        debug!("Fanned out chat to {} peer(s)", self.directory.len());
    }

    fn notify(&self, notice: Notice) {
        // Nobody listening is fine (e.g. headless tests)
        let _ = self.notices.send(notice);
    }
}
