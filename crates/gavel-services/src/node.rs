//! Node agent state: bridges local commands and remote events into the replica.
//!
//! Everything here is synchronous and single-owner. The agent task in
//! `agent.rs` is the only caller, which is what serializes access.

use gavel_core::auction::{AuctionClosed, AuctionOpened, BidPlaced};
use gavel_core::wire::MemberInfo;
use gavel_core::{AuctionEvent, AuctionRecord, CommandError, ItemId, PeerId, Price};

use crate::replica::{BidRule, ReplicaStore};

/// A committed local change and who should hear about it.
#[derive(Debug, Clone)]
pub struct Committed {
    pub record: AuctionRecord,
    pub event: AuctionEvent,
    pub recipients: Vec<MemberInfo>,
}

/// What applying a remote event did to the replica.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Applied(AuctionRecord),
    /// Already reflected (duplicate open or close). Nothing changed.
    Ignored,
    /// Refused; nothing changed.
    Rejected(CommandError),
}

/// Read-only view of the agent for operators.
#[derive(Debug, Clone)]
pub struct NodeSnapshot {
    pub identity: PeerId,
    pub auctions: Vec<AuctionRecord>,
    pub known_peers: Vec<MemberInfo>,
}

pub struct NodeAgent {
    identity: PeerId,
    replica: ReplicaStore,
    known_peers: Vec<MemberInfo>,
}

impl NodeAgent {
    pub fn new(identity: PeerId) -> Self {
        Self {
            identity,
            replica: ReplicaStore::new(),
            known_peers: Vec::new(),
        }
    }

    pub fn identity(&self) -> &PeerId {
        &self.identity
    }

    pub fn replica(&self) -> &ReplicaStore {
        &self.replica
    }

    pub fn known_peers(&self) -> &[MemberInfo] {
        &self.known_peers
    }

    /// Replace the membership snapshot wholesale.
    pub fn replace_known_peers(&mut self, peers: Vec<MemberInfo>) {
        if peers.len() != self.known_peers.len() {
            tracing::debug!(
                before = self.known_peers.len(),
                after = peers.len(),
                "known peers changed"
            );
        }
        self.known_peers = peers;
    }

    /// Every known peer except ourselves.
    pub fn recipients(&self) -> Vec<MemberInfo> {
        self.known_peers
            .iter()
            .filter(|p| p.identity != self.identity)
            .cloned()
            .collect()
    }

    pub fn snapshot(&self) -> NodeSnapshot {
        NodeSnapshot {
            identity: self.identity.clone(),
            auctions: self.replica.list(),
            known_peers: self.known_peers.clone(),
        }
    }

    // ── Local commands ────────────────────────────────────────────────────────

    pub fn open_auction(
        &mut self,
        item_id: ItemId,
        start_price: Price,
    ) -> Result<Committed, CommandError> {
        let record = AuctionRecord::opened(item_id.clone(), self.identity.clone(), start_price);
        let record = self.replica.open(record)?.clone();
        tracing::info!(item_id = %item_id, start_price, "auction opened");
        Ok(self.commit(
            record,
            AuctionEvent::Opened(AuctionOpened {
                sender: self.identity.clone(),
                item_id,
                start_price,
            }),
        ))
    }

    pub fn place_bid(&mut self, item_id: ItemId, price: Price) -> Result<Committed, CommandError> {
        let record = self
            .replica
            .bid(&item_id, price, &self.identity, BidRule::NonDecreasing)?
            .clone();
        tracing::info!(item_id = %item_id, price, "bid placed");
        Ok(self.commit(
            record,
            AuctionEvent::BidPlaced(BidPlaced {
                sender: self.identity.clone(),
                item_id,
                price,
            }),
        ))
    }

    pub fn close_auction(&mut self, item_id: ItemId) -> Result<Committed, CommandError> {
        let record = self.replica.close(&item_id, &self.identity)?.clone();
        tracing::info!(item_id = %item_id, price = record.current_price, "auction closed");
        Ok(self.commit(
            record,
            AuctionEvent::Closed(AuctionClosed {
                sender: self.identity.clone(),
                item_id,
            }),
        ))
    }

    fn commit(&self, record: AuctionRecord, event: AuctionEvent) -> Committed {
        Committed {
            record,
            event,
            recipients: self.recipients(),
        }
    }

    // ── Remote events ─────────────────────────────────────────────────────────

    pub fn apply_event(&mut self, event: &AuctionEvent) -> EventOutcome {
        let sender = event.sender();
        let result = match event {
            AuctionEvent::Opened(e) => self.replica.open(AuctionRecord::opened(
                e.item_id.clone(),
                e.sender.clone(),
                e.start_price,
            )),
            AuctionEvent::BidPlaced(e) => {
                self.replica
                    .bid(&e.item_id, e.price, &e.sender, BidRule::LastArrivalWins)
            }
            AuctionEvent::Closed(e) => self.replica.close(&e.item_id, &e.sender),
        };

        let outcome = match result {
            Ok(record) => EventOutcome::Applied(record.clone()),
            Err(CommandError::DuplicateOpen(_)) => EventOutcome::Ignored,
            Err(CommandError::AuctionClosed(_)) if matches!(event, AuctionEvent::Closed(_)) => {
                EventOutcome::Ignored
            }
            Err(e) => EventOutcome::Rejected(e),
        };

        match &outcome {
            EventOutcome::Applied(record) => tracing::info!(
                method = event.method(),
                sender = sender.short(),
                item_id = %record.item_id,
                price = record.current_price,
                "remote event applied"
            ),
            EventOutcome::Ignored => tracing::debug!(
                method = event.method(),
                sender = sender.short(),
                item_id = event.item_id(),
                "remote event already reflected"
            ),
            EventOutcome::Rejected(e) => tracing::warn!(
                method = event.method(),
                sender = sender.short(),
                item_id = event.item_id(),
                error = %e,
                "remote event rejected"
            ),
        }
        outcome
    }
}
