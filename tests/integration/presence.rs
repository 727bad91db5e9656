//! Presence expiry over TCP, driven by a manual clock.

use std::time::Duration;

use anyhow::Result;
use gavel_core::wire::{HeartbeatRequest, PresenceStatus};
use gavel_core::PeerId;
use gavel_services::net::TcpDirectoryClient;
use gavel_services::tasks::sweep_once;
use gavel_services::{start_directory, DirectoryClient, ManualClock};

use crate::*;

fn heartbeat(id: &str, nonce: u64) -> HeartbeatRequest {
    HeartbeatRequest {
        identity: PeerId::from(id),
        endpoint: format!("{id}.invalid:1"),
        nonce,
        timestamp: 0,
    }
}

#[tokio::test]
async fn silent_peer_expires_after_ttl() -> Result<()> {
    let clock = ManualClock::new(0);
    let dir = start_directory("127.0.0.1:0", &test_timing(), clock.clone()).await?;
    let client = TcpDirectoryClient::new(dir.addr().to_string(), Duration::from_secs(2));

    let ack = client.heartbeat(heartbeat("p1", 126)).await?;
    assert_eq!(ack.nonce, 127);
    assert_eq!(ack.status, PresenceStatus::Added);

    clock.set(20_000);
    let peers = client.query_membership().await?;
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].identity, PeerId::from("p1"));

    clock.set(30_000);
    assert_eq!(client.query_membership().await?.len(), 1);

    clock.set(61_000);
    assert!(client.query_membership().await?.is_empty());
    assert_eq!(sweep_once(dir.presence(), &clock), vec![PeerId::from("p1")]);
    assert!(dir.presence().is_empty());

    // Coming back is a fresh join.
    let ack = client.heartbeat(heartbeat("p1", 5)).await?;
    assert_eq!(ack.status, PresenceStatus::Added);

    dir.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn repeated_heartbeats_keep_one_entry() -> Result<()> {
    let dir = directory().await?;
    let a = node("alice", &dir).await?;

    a.heartbeat_now(1).await?;
    let ack = a.heartbeat_now(2).await?;
    assert_eq!(ack.status, PresenceStatus::Exists);
    assert_eq!(dir.presence().len(), 1);

    a.refresh_now().await?;
    let snap = a.agent().snapshot().await?;
    assert_eq!(snap.known_peers.len(), 1);
    assert_eq!(snap.known_peers[0].endpoint, a.endpoint());

    a.shutdown().await;
    dir.shutdown().await;
    Ok(())
}
