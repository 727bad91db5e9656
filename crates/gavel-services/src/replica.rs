//! Replica store: one node's table of auction records, keyed by item id.
//!
//! Owned by exactly one node agent. Every mutation validates first and
//! writes second, so a rejected operation never leaves a partial update.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use gavel_core::{AuctionRecord, AuctionStatus, CommandError, PeerId, Price};

/// How a bid relates to the price already recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidRule {
    /// Local bids: the price may not go down.
    NonDecreasing,
    /// Remote bids: whatever arrives last is applied.
    LastArrivalWins,
}

#[derive(Debug, Default)]
pub struct ReplicaStore {
    records: HashMap<String, AuctionRecord>,
}

impl ReplicaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new auction. The item id must not already be present.
    pub fn open(&mut self, record: AuctionRecord) -> Result<&AuctionRecord, CommandError> {
        match self.records.entry(record.item_id.clone()) {
            Entry::Occupied(e) => Err(CommandError::DuplicateOpen(e.key().clone())),
            Entry::Vacant(e) => Ok(e.insert(record)),
        }
    }

    /// Record a bid on an open auction.
    pub fn bid(
        &mut self,
        item_id: &str,
        price: Price,
        bidder: &PeerId,
        rule: BidRule,
    ) -> Result<&AuctionRecord, CommandError> {
        let record = self.open_record_mut(item_id)?;
        if rule == BidRule::NonDecreasing && price < record.current_price {
            return Err(CommandError::BidTooLow {
                item_id: item_id.to_string(),
                current: record.current_price,
                offered: price,
            });
        }
        record.current_price = price;
        record.highest_bidder = Some(bidder.clone());
        Ok(record)
    }

    /// Close an open auction on behalf of `requester`, who must be its owner.
    pub fn close(
        &mut self,
        item_id: &str,
        requester: &PeerId,
    ) -> Result<&AuctionRecord, CommandError> {
        let record = self
            .records
            .get_mut(item_id)
            .ok_or_else(|| CommandError::UnknownItem(item_id.to_string()))?;
        if &record.owner != requester {
            return Err(CommandError::UnauthorizedClose {
                item_id: item_id.to_string(),
                owner: record.owner.clone(),
                requester: requester.clone(),
            });
        }
        if !record.is_open() {
            return Err(CommandError::AuctionClosed(item_id.to_string()));
        }
        record.status = AuctionStatus::Closed;
        Ok(record)
    }

    pub fn get(&self, item_id: &str) -> Option<&AuctionRecord> {
        self.records.get(item_id)
    }

    /// All records, sorted by item id.
    pub fn list(&self) -> Vec<AuctionRecord> {
        let mut records: Vec<AuctionRecord> = self.records.values().cloned().collect();
        records.sort_by(|a, b| a.item_id.cmp(&b.item_id));
        records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn open_record_mut(&mut self, item_id: &str) -> Result<&mut AuctionRecord, CommandError> {
        let record = self
            .records
            .get_mut(item_id)
            .ok_or_else(|| CommandError::UnknownItem(item_id.to_string()))?;
        if !record.is_open() {
            return Err(CommandError::AuctionClosed(item_id.to_string()));
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> PeerId {
        PeerId::from("alice")
    }

    fn bob() -> PeerId {
        PeerId::from("bob")
    }

    fn store_with_x1() -> ReplicaStore {
        let mut store = ReplicaStore::new();
        store.open(AuctionRecord::opened("X1", alice(), 100)).unwrap();
        store
    }

    #[test]
    fn new_store_is_empty() {
        let store = ReplicaStore::new();
        assert!(store.is_empty());
        assert!(store.get("X1").is_none());
    }

    #[test]
    fn duplicate_open_keeps_original() {
        let mut store = store_with_x1();
        let err = store
            .open(AuctionRecord::opened("X1", bob(), 5))
            .unwrap_err();
        assert_eq!(err, CommandError::DuplicateOpen("X1".into()));

        let r = store.get("X1").unwrap();
        assert_eq!(r.owner, alice());
        assert_eq!(r.current_price, 100);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn bid_updates_price_and_bidder() {
        let mut store = store_with_x1();
        let r = store.bid("X1", 150, &bob(), BidRule::NonDecreasing).unwrap();
        assert_eq!(r.current_price, 150);
        assert_eq!(r.highest_bidder, Some(bob()));
    }

    #[test]
    fn bid_on_unknown_item_fails() {
        let mut store = ReplicaStore::new();
        assert_eq!(
            store.bid("nope", 1, &bob(), BidRule::LastArrivalWins),
            Err(CommandError::UnknownItem("nope".into()))
        );
    }

    #[test]
    fn lower_bid_rejected_only_under_non_decreasing_rule() {
        let mut store = store_with_x1();
        let err = store.bid("X1", 90, &bob(), BidRule::NonDecreasing).unwrap_err();
        assert!(matches!(err, CommandError::BidTooLow { current: 100, offered: 90, .. }));
        assert_eq!(store.get("X1").unwrap().current_price, 100);
        assert!(store.get("X1").unwrap().highest_bidder.is_none());

        let r = store.bid("X1", 90, &bob(), BidRule::LastArrivalWins).unwrap();
        assert_eq!(r.current_price, 90);
    }

    #[test]
    fn only_owner_closes() {
        let mut store = store_with_x1();
        let err = store.close("X1", &bob()).unwrap_err();
        assert!(matches!(err, CommandError::UnauthorizedClose { .. }));
        assert!(store.get("X1").unwrap().is_open());

        let r = store.close("X1", &alice()).unwrap();
        assert_eq!(r.status, AuctionStatus::Closed);
    }

    #[test]
    fn closed_is_terminal() {
        let mut store = store_with_x1();
        store.close("X1", &alice()).unwrap();

        assert_eq!(
            store.close("X1", &alice()),
            Err(CommandError::AuctionClosed("X1".into()))
        );
        assert_eq!(
            store.bid("X1", 500, &bob(), BidRule::LastArrivalWins),
            Err(CommandError::AuctionClosed("X1".into()))
        );
        assert_eq!(store.get("X1").unwrap().current_price, 100);
    }

    #[test]
    fn list_is_sorted() {
        let mut store = ReplicaStore::new();
        store.open(AuctionRecord::opened("b", alice(), 1)).unwrap();
        store.open(AuctionRecord::opened("a", alice(), 1)).unwrap();
        let ids: Vec<String> = store.list().into_iter().map(|r| r.item_id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
