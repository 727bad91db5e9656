//! Daemon status, peers and shutdown commands.

use anyhow::Result;
use serde::Deserialize;

use super::http::{base_url, get_json, post_json};

// ── Response types ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct StatusResponse {
    peer_id: String,
    discovery_key: String,
    auctions: usize,
    open_auctions: usize,
    known_peers: usize,
}

#[derive(Deserialize)]
struct PeersResponse {
    peers: Vec<PeerInfo>,
}

#[derive(Deserialize)]
struct PeerInfo {
    identity: String,
    endpoint: String,
    last_heartbeat: u64,
}

#[derive(Deserialize)]
struct ShutdownResponse {
    message: String,
}

// ── Commands ──────────────────────────────────────────────────────────────────

pub async fn cmd_status(port: u16) -> Result<()> {
    let resp: StatusResponse = get_json(&format!("{}/status", base_url(port))).await?;

    println!("═══════════════════════════════════════");
    println!("  Gavel Node Status");
    println!("═══════════════════════════════════════");
    println!("  Peer id        : {}", resp.peer_id);
    println!("  Discovery key  : {}", resp.discovery_key);
    println!("  Known peers    : {}", resp.known_peers);
    println!("  Auctions       : {} ({} open)", resp.auctions, resp.open_auctions);

    Ok(())
}

pub async fn cmd_peers(port: u16) -> Result<()> {
    let resp: PeersResponse = get_json(&format!("{}/peers", base_url(port))).await?;

    if resp.peers.is_empty() {
        println!("No peers known yet.");
        return Ok(());
    }

    println!("═══════════════════════════════════════");
    println!("  Known Peers ({})", resp.peers.len());
    println!("═══════════════════════════════════════");

    for p in &resp.peers {
        let short = &p.identity[..p.identity.len().min(16)];
        println!("  ┌─ {}", short);
        println!("  │  endpoint       : {}", p.endpoint);
        println!("  └─ last heartbeat : {} ms", p.last_heartbeat);
    }

    Ok(())
}

pub async fn cmd_shutdown(port: u16) -> Result<()> {
    let resp: ShutdownResponse = post_json(&format!("{}/daemon/shutdown", base_url(port))).await?;
    println!("{}", resp.message);
    Ok(())
}
