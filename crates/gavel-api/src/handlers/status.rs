//! /status, /peers, /daemon/shutdown handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use gavel_core::wire::MemberInfo;

use super::{agent_error, ApiState};

// ── /status ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StatusResponse {
    pub peer_id: String,
    pub discovery_key: String,
    pub auctions: usize,
    pub open_auctions: usize,
    pub known_peers: usize,
}

pub async fn handle_status(
    State(state): State<ApiState>,
) -> Result<Json<StatusResponse>, (StatusCode, String)> {
    let snapshot = state.agent.snapshot().await.map_err(agent_error)?;
    Ok(Json(StatusResponse {
        peer_id: snapshot.identity.to_string(),
        discovery_key: state.discovery_key.clone(),
        auctions: snapshot.auctions.len(),
        open_auctions: snapshot.auctions.iter().filter(|r| r.is_open()).count(),
        known_peers: snapshot.known_peers.len(),
    }))
}

// ── /peers ───────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct PeersResponse {
    pub peers: Vec<MemberInfo>,
}

pub async fn handle_peers(
    State(state): State<ApiState>,
) -> Result<Json<PeersResponse>, (StatusCode, String)> {
    let snapshot = state.agent.snapshot().await.map_err(agent_error)?;
    Ok(Json(PeersResponse {
        peers: snapshot.known_peers,
    }))
}

// ── /daemon/shutdown ──────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ShutdownResponse {
    pub message: String,
}

pub async fn handle_shutdown(State(state): State<ApiState>) -> Json<ShutdownResponse> {
    tracing::info!("shutdown requested via API");
    let _ = state.shutdown_tx.send(());

    Json(ShutdownResponse {
        message: "Shutdown initiated".to_string(),
    })
}
