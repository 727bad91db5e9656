//! Transport seams between a node and the outside world.
//!
//! The agent only ever talks to other processes through these traits, so
//! tests can swap the TCP implementation for an in-memory one.

use async_trait::async_trait;
use gavel_core::wire::{HeartbeatAck, HeartbeatRequest, MemberInfo};
use gavel_core::{AuctionEvent, TransportError};

/// Delivers auction events to a single peer.
#[async_trait]
pub trait PeerTransport: Send + Sync + 'static {
    /// Send one event and wait for the peer's ack.
    async fn deliver(&self, peer: &MemberInfo, event: &AuctionEvent) -> Result<(), TransportError>;
}

/// Talks to the presence directory.
#[async_trait]
pub trait DirectoryClient: Send + Sync + 'static {
    async fn heartbeat(&self, request: HeartbeatRequest) -> Result<HeartbeatAck, TransportError>;

    async fn query_membership(&self) -> Result<Vec<MemberInfo>, TransportError>;
}
