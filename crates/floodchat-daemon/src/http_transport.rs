//! HTTP implementation of `PeerTransport` using reqwest.
//!
//! Peers are addressed as `http://<address>/join` and `http://<address>/chat`.

use async_trait::async_trait;
use floodchat_core::transport::{self, PeerTransport, TransportError};
use floodchat_core::wire::{CHAT_PATH, JOIN_PATH};
use floodchat_core::{ChatMsg, Peer};
use std::time::Duration;
use tracing::debug;

#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a client, optionally with a per-request timeout.
    pub fn new(timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    async fn post<T: serde::Serialize + ?Sized>(
        &self,
        target: &Peer,
        path: &str,
        body: &T,
    ) -> transport::Result<reqwest::Response> {
        let url = endpoint_url(&target.address, path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(map_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl PeerTransport for HttpTransport {
    async fn announce_join(&self, target: &Peer, joiner: &Peer) -> transport::Result<Vec<u8>> {
        let response = self.post(target, JOIN_PATH, joiner).await?;
        let body = response.bytes().await.map_err(map_error)?;
        Ok(body.to_vec())
    }

    async fn deliver_chat(&self, target: &Peer, msg: &ChatMsg) -> transport::Result<()> {
        self.post(target, CHAT_PATH, msg).await?;
        Ok(())
    }
}

pub fn endpoint_url(address: &str, path: &str) -> String {
    format!("http://{}{}", address, path)
}

fn map_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_connect() {
        TransportError::ConnectionFailed(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}
