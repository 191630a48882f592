//! Inbound gateway: the `/join` and `/chat` HTTP endpoints.
//!
//! Handlers never touch membership state directly. They turn each request
//! into coordinator events and, for joins, wait for the directory snapshot.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use floodchat_core::wire::{self, CHAT_PATH, JOIN_PATH};
use floodchat_core::{CoordinatorError, CoordinatorHandle, Peers};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::config::DecodePolicy;

/// Shared handler state
pub struct GatewayState {
    pub handle: CoordinatorHandle,
    pub decode_policy: DecodePolicy,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Malformed {what}: {reason}")]
    Malformed { what: &'static str, reason: String },

    #[error("Node is shutting down")]
    Unavailable(#[from] CoordinatorError),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match self {
            GatewayError::Malformed { .. } => StatusCode::BAD_REQUEST,
            GatewayError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, self.to_string()).into_response()
    }
}

pub fn router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route(JOIN_PATH, post(join_handler))
        .route(CHAT_PATH, post(chat_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `POST /join`: admit the caller, answer with our directory.
async fn join_handler(
    State(state): State<Arc<GatewayState>>,
    body: Bytes,
) -> Result<Json<Peers>, GatewayError> {
    let joiner = apply_policy(wire::decode_peer(&body), "join request", state.decode_policy)?;
    debug!("Join request from {}", joiner);

    state.handle.join(joiner)?;
    let peers = state.handle.peers().await?;
    Ok(Json(peers))
}

/// `POST /chat`: hand the message to the coordinator for display.
async fn chat_handler(
    State(state): State<Arc<GatewayState>>,
    body: Bytes,
) -> Result<StatusCode, GatewayError> {
    let msg = apply_policy(wire::decode_chat(&body), "chat message", state.decode_policy)?;

    state.handle.message_received(msg)?;
    Ok(StatusCode::OK)
}

/// Log a decode failure, then either fall back to the zero value or refuse.
fn apply_policy<T: Default>(
    decoded: serde_json::Result<T>,
    what: &'static str,
    policy: DecodePolicy,
) -> Result<T, GatewayError> {
    let e = match decoded {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };
    warn!("Error decoding {}: {}", what, e);
    match policy {
        DecodePolicy::Permissive => Ok(T::default()),
        DecodePolicy::Reject => Err(GatewayError::Malformed {
            what,
            reason: e.to_string(),
        }),
    }
}
