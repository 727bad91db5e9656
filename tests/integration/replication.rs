//! Auction events replicate between nodes over TCP.

use anyhow::Result;
use gavel_core::{AuctionStatus, PeerId};

use crate::*;

#[tokio::test]
async fn open_bid_close_converges_across_nodes() -> Result<()> {
    let dir = directory().await?;
    let a = node("alice", &dir).await?;
    let b = node("bob", &dir).await?;
    join(&[&a, &b]).await?;

    let opened = a.agent().open_auction("X1", 100).await?;
    assert_eq!(opened.broadcast.recipients(), 1);
    let report = opened.broadcast.finished().await;
    assert_eq!(report.delivered, vec![PeerId::from("bob")]);

    let snap = b.agent().snapshot().await?;
    assert_eq!(snap.auctions.len(), 1);
    assert_eq!(snap.auctions[0].owner, PeerId::from("alice"));
    assert_eq!(snap.auctions[0].current_price, 100);

    let bid = b.agent().place_bid("X1", 150).await?;
    bid.broadcast.finished().await;
    let closed = a.agent().close_auction("X1").await?;
    closed.broadcast.finished().await;

    let on_a = a.agent().snapshot().await?.auctions;
    let on_b = b.agent().snapshot().await?.auctions;
    assert_eq!(on_a, on_b);
    assert_eq!(on_a[0].status, AuctionStatus::Closed);
    assert_eq!(on_a[0].current_price, 150);
    assert_eq!(on_a[0].highest_bidder, Some(PeerId::from("bob")));

    a.shutdown().await;
    b.shutdown().await;
    dir.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn non_owner_cannot_close_remotely_opened_auction() -> Result<()> {
    let dir = directory().await?;
    let a = node("alice", &dir).await?;
    let b = node("bob", &dir).await?;
    join(&[&a, &b]).await?;

    a.agent().open_auction("X1", 100).await?.broadcast.finished().await;
    assert!(b.agent().close_auction("X1").await.is_err());

    let snap = eventually(&a, |s| s.auctions.len() == 1).await?;
    assert_eq!(snap.auctions[0].status, AuctionStatus::Open);

    a.shutdown().await;
    b.shutdown().await;
    dir.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn three_nodes_all_receive_an_open() -> Result<()> {
    let dir = directory().await?;
    let a = node("alice", &dir).await?;
    let b = node("bob", &dir).await?;
    let c = node("carol", &dir).await?;
    join(&[&a, &b, &c]).await?;

    let receipt = c.agent().open_auction("lamp", 5).await?;
    assert_eq!(receipt.broadcast.finished().await.delivered.len(), 2);

    for n in [&a, &b] {
        let snap = n.agent().snapshot().await?;
        assert_eq!(snap.auctions[0].owner, PeerId::from("carol"));
    }

    for n in [a, b, c] {
        n.shutdown().await;
    }
    dir.shutdown().await;
    Ok(())
}
