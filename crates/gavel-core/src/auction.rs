//! Auction records and the events that replicate them between peers.

use serde::{Deserialize, Serialize};

use crate::identity::PeerId;

/// Natural key of an auction on a replica.
pub type ItemId = String;

/// Price in the auction's minor currency unit.
pub type Price = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuctionStatus {
    Open,
    Closed,
}

/// One node's view of an auction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionRecord {
    pub item_id: ItemId,
    pub owner: PeerId,
    pub current_price: Price,
    /// None until the first bid is observed.
    pub highest_bidder: Option<PeerId>,
    pub status: AuctionStatus,
}

impl AuctionRecord {
    /// A freshly opened auction with no bids.
    pub fn opened(item_id: impl Into<ItemId>, owner: PeerId, start_price: Price) -> Self {
        Self {
            item_id: item_id.into(),
            owner,
            current_price: start_price,
            highest_bidder: None,
            status: AuctionStatus::Open,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == AuctionStatus::Open
    }
}

// ── Events ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionOpened {
    pub sender: PeerId,
    pub item_id: ItemId,
    pub start_price: Price,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidPlaced {
    pub sender: PeerId,
    pub item_id: ItemId,
    pub price: Price,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionClosed {
    pub sender: PeerId,
    pub item_id: ItemId,
}

/// A local state change announced to every known peer.
///
/// Events carry no sequence number; receivers apply them in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuctionEvent {
    Opened(AuctionOpened),
    BidPlaced(BidPlaced),
    Closed(AuctionClosed),
}

impl AuctionEvent {
    pub fn sender(&self) -> &PeerId {
        match self {
            Self::Opened(e) => &e.sender,
            Self::BidPlaced(e) => &e.sender,
            Self::Closed(e) => &e.sender,
        }
    }

    pub fn item_id(&self) -> &str {
        match self {
            Self::Opened(e) => &e.item_id,
            Self::BidPlaced(e) => &e.item_id,
            Self::Closed(e) => &e.item_id,
        }
    }

    /// RPC method name this event travels under.
    pub fn method(&self) -> &'static str {
        match self {
            Self::Opened(_) => "auction-opened",
            Self::BidPlaced(_) => "bid-placed",
            Self::Closed(_) => "auction-closed",
        }
    }
}
