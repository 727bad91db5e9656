//! /auctions handlers: list, inspect and drive auctions on this node.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use gavel_core::{AuctionRecord, ItemId, Price};
use gavel_services::CommandReceipt;

use super::{agent_error, ApiState};

#[derive(Serialize)]
pub struct CommandResponse {
    pub record: AuctionRecord,
    /// Peers the resulting event was sent to.
    pub broadcast_to: usize,
}

impl From<CommandReceipt> for CommandResponse {
    fn from(receipt: CommandReceipt) -> Self {
        Self {
            broadcast_to: receipt.broadcast.recipients(),
            record: receipt.record,
        }
    }
}

// ── /auctions (GET) ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct AuctionsResponse {
    pub auctions: Vec<AuctionRecord>,
}

pub async fn handle_list_auctions(
    State(state): State<ApiState>,
) -> Result<Json<AuctionsResponse>, (StatusCode, String)> {
    let snapshot = state.agent.snapshot().await.map_err(agent_error)?;
    Ok(Json(AuctionsResponse {
        auctions: snapshot.auctions,
    }))
}

// ── /auctions/{item_id} (GET) ─────────────────────────────────────────────────

pub async fn handle_get_auction(
    State(state): State<ApiState>,
    Path(item_id): Path<ItemId>,
) -> Result<Json<AuctionRecord>, (StatusCode, String)> {
    state
        .agent
        .get(item_id.clone())
        .await
        .map_err(agent_error)?
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("no auction for item '{item_id}'")))
}

// ── /auctions (POST) ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct OpenRequest {
    pub item_id: ItemId,
    pub start_price: Price,
}

pub async fn handle_open_auction(
    State(state): State<ApiState>,
    Json(req): Json<OpenRequest>,
) -> Result<Json<CommandResponse>, (StatusCode, String)> {
    if req.item_id.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "item_id must not be empty".to_string()));
    }
    let receipt = state
        .agent
        .open_auction(req.item_id, req.start_price)
        .await
        .map_err(agent_error)?;
    Ok(Json(receipt.into()))
}

// ── /auctions/{item_id}/bid (POST) ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct BidRequest {
    pub price: Price,
}

pub async fn handle_place_bid(
    State(state): State<ApiState>,
    Path(item_id): Path<ItemId>,
    Json(req): Json<BidRequest>,
) -> Result<Json<CommandResponse>, (StatusCode, String)> {
    let receipt = state
        .agent
        .place_bid(item_id, req.price)
        .await
        .map_err(agent_error)?;
    Ok(Json(receipt.into()))
}

// ── /auctions/{item_id}/close (POST) ──────────────────────────────────────────

pub async fn handle_close_auction(
    State(state): State<ApiState>,
    Path(item_id): Path<ItemId>,
) -> Result<Json<CommandResponse>, (StatusCode, String)> {
    let receipt = state
        .agent
        .close_auction(item_id)
        .await
        .map_err(agent_error)?;
    Ok(Json(receipt.into()))
}
