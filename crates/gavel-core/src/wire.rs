//! Gavel wire format: RPC requests and responses between processes.
//!
//! Every exchange is one request frame followed by one response frame.
//! A frame is a 4-byte big-endian payload length and a JSON document.
//! Requests are tagged by `"method"`, responses by `"kind"`.
//! The frame I/O itself lives with the transport in gavel-services.

use serde::{Deserialize, Serialize};

use crate::auction::{AuctionClosed, AuctionEvent, AuctionOpened, BidPlaced};
use crate::identity::PeerId;

// ── Protocol constants ────────────────────────────────────────────────────────

/// Length of the frame header.
pub const FRAME_HEADER_LEN: usize = 4;

/// Largest accepted frame payload. Anything bigger is a protocol error.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Default period between heartbeats from a node to the directory.
pub const HEARTBEAT_INTERVAL_SECS: u64 = 5;

/// Default period between membership refreshes on a node.
pub const MEMBERSHIP_REFRESH_SECS: u64 = 10;

/// Default period of the directory's expiry sweep.
pub const SWEEP_INTERVAL_SECS: u64 = 30;

/// Peers silent for longer than this are evicted.
pub const PEER_TTL_SECS: u64 = 30;

/// Default bound on a single peer delivery during broadcast.
pub const BROADCAST_TIMEOUT_MS: u64 = 3000;

// ── Directory payloads ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatRequest {
    pub identity: PeerId,
    /// Address the sender accepts peer RPC on.
    pub endpoint: String,
    /// Echoed back incremented.
    pub nonce: u64,
    /// Sender's clock, Unix ms.
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    /// First heartbeat from this identity.
    Added,
    /// Identity was already live; its record was refreshed.
    Exists,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatAck {
    pub nonce: u64,
    pub status: PresenceStatus,
}

/// One live peer in a membership snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInfo {
    pub identity: PeerId,
    pub endpoint: String,
    /// Directory clock at the last heartbeat, Unix ms.
    pub last_heartbeat: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub peers: Vec<MemberInfo>,
}

// ── Envelopes ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum Request {
    Heartbeat(HeartbeatRequest),
    QueryMembership,
    AuctionOpened(AuctionOpened),
    BidPlaced(BidPlaced),
    AuctionClosed(AuctionClosed),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Response {
    Heartbeat(HeartbeatAck),
    Membership(Membership),
    Ack,
    Error { message: String },
}

impl Request {
    pub fn method(&self) -> &'static str {
        match self {
            Self::Heartbeat(_) => "heartbeat",
            Self::QueryMembership => "query-membership",
            Self::AuctionOpened(_) => "auction-opened",
            Self::BidPlaced(_) => "bid-placed",
            Self::AuctionClosed(_) => "auction-closed",
        }
    }

    /// The auction event carried by this request, if any.
    pub fn into_event(self) -> Option<AuctionEvent> {
        match self {
            Self::AuctionOpened(e) => Some(AuctionEvent::Opened(e)),
            Self::BidPlaced(e) => Some(AuctionEvent::BidPlaced(e)),
            Self::AuctionClosed(e) => Some(AuctionEvent::Closed(e)),
            Self::Heartbeat(_) | Self::QueryMembership => None,
        }
    }
}

impl From<AuctionEvent> for Request {
    fn from(event: AuctionEvent) -> Self {
        match event {
            AuctionEvent::Opened(e) => Self::AuctionOpened(e),
            AuctionEvent::BidPlaced(e) => Self::BidPlaced(e),
            AuctionEvent::Closed(e) => Self::AuctionClosed(e),
        }
    }
}

impl Response {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

// ── Encoding ──────────────────────────────────────────────────────────────────

/// Serialize a frame payload.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(value)
}

/// Deserialize a frame payload.
pub fn decode<'a, T: Deserialize<'a>>(payload: &'a [u8]) -> Result<T, serde_json::Error> {
    serde_json::from_slice(payload)
}
