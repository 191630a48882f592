//! floodchat: peer-to-peer terminal chat with flood-join membership.
//!
//! Lines typed on stdin are sent to every known peer. Console output goes to
//! stdout; logs go to stderr.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use floodchat_daemon::input;
use floodchat_daemon::{DecodePolicy, Node, NodeConfig};

#[derive(Parser, Debug)]
#[command(name = "floodchat")]
#[command(about = "Peer-to-peer chat with flood-join membership")]
struct Cli {
    /// Listen on port number
    #[arg(short, long, default_value_t = 8000, env = "FLOODCHAT_PORT")]
    port: u16,

    /// Nickname
    #[arg(short, long, default_value = "anonymous", env = "FLOODCHAT_NAME")]
    name: String,

    /// Other peer to join (host:port)
    #[arg(short, long, env = "FLOODCHAT_JOIN")]
    join: Option<String>,

    /// Host to advertise and listen on (detected when omitted)
    #[arg(long, env = "FLOODCHAT_HOST")]
    host: Option<String>,

    /// Answer malformed requests with 400 instead of accepting empty values
    #[arg(long)]
    reject_malformed: bool,

    /// Timeout for outbound requests, in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> NodeConfig {
        let mut config = NodeConfig::new(self.name, self.port);
        if let Some(host) = self.host {
            config = config.with_host(host);
        }
        if let Some(join) = self.join {
            config = config.with_join(join);
        }
        if self.reject_malformed {
            config = config.with_decode_policy(DecodePolicy::Reject);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_request_timeout(Duration::from_secs(secs));
        }
        config
    }
}

/// `--verbose` raises only our own crates to debug, not hyper or reqwest.
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "info,floodchat_core=debug,floodchat_daemon=debug,floodchat=debug"
    } else {
        "info"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the default filter
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(cli.verbose))),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut node = Node::start(cli.into_config()).await?;

    if let Some(mut notices) = node.take_notices() {
        tokio::spawn(async move {
            while let Some(notice) = notices.recv().await {
                if notice.is_console() {
                    println!("{}", notice);
                }
            }
        });
    }

    let _input = input::spawn_stdin(node.handle().clone());

    tokio::select! {
        result = node.server_stopped() => {
            if let Err(e) = &result {
                error!("Server stopped: {}", e);
            }
            result?;
        }
        _ = shutdown_signal() => {}
    }

    node.shutdown().await?;
    info!("floodchat shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
