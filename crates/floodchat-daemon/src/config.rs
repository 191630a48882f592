//! Node configuration and local address detection.

use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, warn};

/// Host advertised when no IPv4 address can be detected.
pub const FALLBACK_HOST: &str = "localhost";

/// What the gateway does with a request body it cannot decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Log and continue with an empty value
    #[default]
    Permissive,
    /// Log and answer 400 without touching the coordinator
    Reject,
}

/// Everything needed to start a node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Nickname shown to other peers
    pub name: String,
    /// Advertised host; detected when `None`
    pub host: Option<String>,
    /// Listen port (0 picks a free one)
    pub port: u16,
    /// Peer address to join at startup
    pub join: Option<String>,
    pub decode_policy: DecodePolicy,
    /// Per-request timeout for outbound calls (none by default)
    pub request_timeout: Option<Duration>,
}

impl NodeConfig {
    pub fn new(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            host: None,
            port,
            join: None,
            decode_policy: DecodePolicy::default(),
            request_timeout: None,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_join(mut self, address: impl Into<String>) -> Self {
        self.join = Some(address.into());
        self
    }

    pub fn with_decode_policy(mut self, policy: DecodePolicy) -> Self {
        self.decode_policy = policy;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// The configured host, or the detected local IPv4 address.
    pub async fn resolve_host(&self) -> String {
        match &self.host {
            Some(host) => host.clone(),
            None => local_ipv4().await,
        }
    }
}

/// First IPv4 address the machine's hostname resolves to, or `localhost`.
pub async fn local_ipv4() -> String {
    let host = match hostname::get() {
        Ok(name) => name.to_string_lossy().to_string(),
        Err(e) => {
            warn!("Could not read hostname: {}", e);
            return FALLBACK_HOST.to_string();
        }
    };

    match tokio::net::lookup_host((host.as_str(), 0)).await {
        Ok(addrs) => {
            let ips: Vec<IpAddr> = addrs.map(|a| a.ip()).collect();
            first_ipv4(&ips).unwrap_or_else(|| {
                debug!("{} has no IPv4 address, using {}", host, FALLBACK_HOST);
                FALLBACK_HOST.to_string()
            })
        }
        Err(e) => {
            warn!("Could not resolve {}: {}", host, e);
            FALLBACK_HOST.to_string()
        }
    }
}

fn first_ipv4(ips: &[IpAddr]) -> Option<String> {
    ips.iter().find(|ip| ip.is_ipv4()).map(|ip| ip.to_string())
}
