//! Gavel integration test harness.
//!
//! Every test runs a presence directory and one or more nodes in-process,
//! talking over real TCP sockets on 127.0.0.1 with OS-assigned ports.
//! Each test is responsible for shutting down what it starts.

use std::time::Duration;

use anyhow::{bail, Result};
use gavel_core::config::TimingConfig;
use gavel_core::PeerId;
use gavel_services::{
    start_directory, start_node, NodeSettings, NodeSnapshot, RunningDirectory, RunningNode,
    SystemClock,
};

mod failures;
mod presence;
mod replication;

// ── Harness ───────────────────────────────────────────────────────────────────

/// Short broadcast timeout so failure tests stay fast; timers keep defaults.
pub fn test_timing() -> TimingConfig {
    TimingConfig {
        broadcast_timeout_ms: 1000,
        ..TimingConfig::default()
    }
}

pub async fn directory() -> Result<RunningDirectory> {
    Ok(start_directory("127.0.0.1:0", &test_timing(), SystemClock).await?)
}

pub async fn node(name: &str, directory: &RunningDirectory) -> Result<RunningNode> {
    Ok(start_node(NodeSettings {
        identity: PeerId::from(name),
        listen_addr: "127.0.0.1:0".into(),
        advertise_addr: String::new(),
        directory_addr: directory.addr().to_string(),
        timing: test_timing(),
    })
    .await?)
}

/// Heartbeat every node, then refresh every node's membership.
pub async fn join(nodes: &[&RunningNode]) -> Result<()> {
    // The node timers tick once at startup; let those land first so a stale
    // membership reply cannot overwrite the refresh below.
    tokio::time::sleep(Duration::from_millis(100)).await;
    for (i, n) in nodes.iter().enumerate() {
        n.heartbeat_now(1000 + i as u64).await?;
    }
    for n in nodes {
        n.refresh_now().await?;
    }
    Ok(())
}

/// Poll a node's snapshot until `check` holds or five seconds pass.
pub async fn eventually(node: &RunningNode, check: impl Fn(&NodeSnapshot) -> bool) -> Result<NodeSnapshot> {
    for _ in 0..100 {
        let snapshot = node.agent().snapshot().await?;
        if check(&snapshot) {
            return Ok(snapshot);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    bail!("condition not reached on {}", node.agent().identity())
}

/// An address nothing is listening on.
pub async fn dead_endpoint() -> Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?.to_string();
    drop(listener);
    Ok(addr)
}
