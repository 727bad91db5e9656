//! A dead peer only costs its own delivery; shutdown is deterministic.

use std::time::Duration;

use anyhow::Result;
use gavel_core::wire::{HeartbeatRequest, Request};
use gavel_core::PeerId;
use gavel_services::net::{call, TcpDirectoryClient};
use gavel_services::{AgentError, DirectoryClient};

use crate::*;

#[tokio::test]
async fn unreachable_peer_does_not_block_others() -> Result<()> {
    let dir = directory().await?;
    let a = node("alice", &dir).await?;
    let b = node("bob", &dir).await?;

    // A member that heartbeated once and then died.
    let client = TcpDirectoryClient::new(dir.addr().to_string(), Duration::from_secs(2));
    client
        .heartbeat(HeartbeatRequest {
            identity: PeerId::from("ghost"),
            endpoint: dead_endpoint().await?,
            nonce: 1,
            timestamp: 0,
        })
        .await?;
    join(&[&a, &b]).await?;
    assert_eq!(a.agent().snapshot().await?.known_peers.len(), 3);

    let receipt = a.agent().open_auction("X1", 100).await?;
    assert_eq!(receipt.record.current_price, 100);
    let report = receipt.broadcast.finished().await;
    assert_eq!(report.delivered, vec![PeerId::from("bob")]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, PeerId::from("ghost"));

    assert_eq!(b.agent().snapshot().await?.auctions.len(), 1);

    a.shutdown().await;
    b.shutdown().await;
    dir.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn node_without_directory_still_serves_commands() -> Result<()> {
    let dir = directory().await?;
    let addr = dir.addr();
    dir.shutdown().await;

    let a = start_node(NodeSettings {
        identity: PeerId::from("alice"),
        listen_addr: "127.0.0.1:0".into(),
        advertise_addr: String::new(),
        directory_addr: addr.to_string(),
        timing: test_timing(),
    })
    .await?;
    assert!(a.refresh_now().await.is_err());

    let receipt = a.agent().open_auction("X1", 1).await?;
    assert_eq!(receipt.broadcast.recipients(), 0);

    a.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn shutdown_stops_agent_and_listener() -> Result<()> {
    let dir = directory().await?;
    let a = node("alice", &dir).await?;
    let agent = a.agent().clone();
    let endpoint = a.endpoint().to_string();

    tokio::time::timeout(Duration::from_secs(5), a.shutdown()).await?;

    assert!(matches!(agent.snapshot().await, Err(AgentError::Stopped)));
    assert!(call(&endpoint, &Request::QueryMembership, Duration::from_secs(1))
        .await
        .is_err());

    dir.shutdown().await;
    Ok(())
}
