//! HTTP API handlers: exposes the node agent as JSON.

pub mod auctions;
pub mod status;

use axum::http::StatusCode;

use gavel_core::CommandError;
use gavel_services::{AgentError, AgentHandle};

#[derive(Clone)]
pub struct ApiState {
    pub agent: AgentHandle,
    /// Hex public key of the discovery keypair.
    pub discovery_key: String,
    /// Shutdown broadcast sender: signals graceful daemon shutdown.
    pub shutdown_tx: tokio::sync::broadcast::Sender<()>,
}

// ── Shared helpers ────────────────────────────────────────────────────────────

/// Map an agent failure onto an HTTP status.
fn agent_error(e: AgentError) -> (StatusCode, String) {
    let status = match &e {
        AgentError::Command(CommandError::UnknownItem(_)) => StatusCode::NOT_FOUND,
        AgentError::Command(CommandError::DuplicateOpen(_))
        | AgentError::Command(CommandError::AuctionClosed(_)) => StatusCode::CONFLICT,
        AgentError::Command(CommandError::UnauthorizedClose { .. }) => StatusCode::FORBIDDEN,
        AgentError::Command(CommandError::BidTooLow { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
        AgentError::Stopped => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, e.to_string())
}

pub use auctions::{
    handle_close_auction, handle_get_auction, handle_list_auctions, handle_open_auction,
    handle_place_bid,
};
pub use status::{handle_peers, handle_shutdown, handle_status};
