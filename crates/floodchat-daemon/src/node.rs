//! A running chat node: listener, coordinator and HTTP gateway wired together.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use floodchat_core::{Coordinator, CoordinatorHandle, Notice, Peer};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::NodeConfig;
use crate::gateway::{self, GatewayState};
use crate::http_transport::HttpTransport;

pub struct Node {
    handle: CoordinatorHandle,
    local_addr: SocketAddr,
    notices: Option<mpsc::UnboundedReceiver<Notice>>,
    coordinator: JoinHandle<()>,
    server: JoinHandle<std::io::Result<()>>,
    stop_server: oneshot::Sender<()>,
}

impl Node {
    /// Bind, start the coordinator and gateway, and join the bootstrap peer.
    ///
    /// Fails if the listen address cannot be bound.
    pub async fn start(config: NodeConfig) -> Result<Self> {
        let host = config.resolve_host().await;
        let bind_addr = format!("{}:{}", host, config.port);

        let listener = TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("Failed to listen on {}", bind_addr))?;
        let local_addr = listener.local_addr()?;

        // Port 0 only becomes concrete after binding
        let self_peer = Peer::new(config.name.clone(), format!("{}:{}", host, local_addr.port()));
        info!("Node {} bound to {}", self_peer, local_addr);

        let transport = HttpTransport::new(config.request_timeout)?;
        let (coordinator, handle, notices) = Coordinator::new(self_peer, Arc::new(transport));
        let coordinator = coordinator.spawn();

        let app = gateway::router(Arc::new(GatewayState {
            handle: handle.clone(),
            decode_policy: config.decode_policy,
        }));

        let (stop_server, stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = stop_rx.await;
                })
                .await
        });

        if let Some(address) = config.join {
            info!("Joining {}", address);
            handle.join(Peer::unnamed(address))?;
        }

        Ok(Self {
            handle,
            local_addr,
            notices: Some(notices),
            coordinator,
            server,
            stop_server,
        })
    }

    pub fn handle(&self) -> &CoordinatorHandle {
        &self.handle
    }

    pub fn self_peer(&self) -> &Peer {
        self.handle.self_peer()
    }

    /// Socket the gateway is listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Take the console notice stream. Returns `None` after the first call.
    pub fn take_notices(&mut self) -> Option<mpsc::UnboundedReceiver<Notice>> {
        self.notices.take()
    }

    /// Resolves if the HTTP server stops on its own.
    pub async fn server_stopped(&mut self) -> Result<()> {
        (&mut self.server).await.context("Server task panicked")??;
        Ok(())
    }

    /// Stop accepting requests and stop the coordinator.
    pub async fn shutdown(self) -> Result<()> {
        debug!("Shutting down {}", self.handle.self_peer());

        let _ = self.stop_server.send(());
        if !self.server.is_finished() {
            self.server.await.context("Server task panicked")??;
        }

        // Already stopped is fine
        let _ = self.handle.shutdown();
        self.coordinator.await.context("Coordinator task panicked")?;

        info!("Node stopped");
        Ok(())
    }
}
