//! floodchat-daemon library: the HTTP node around floodchat-core.
//!
//! Exposed as a library so integration tests can start real nodes.

pub mod config;
pub mod gateway;
pub mod http_transport;
pub mod input;
pub mod node;

pub use config::{DecodePolicy, NodeConfig};
pub use http_transport::HttpTransport;
pub use node::Node;
