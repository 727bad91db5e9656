//! Error taxonomy shared by every Gavel crate.

use thiserror::Error;

use crate::auction::{ItemId, Price};
use crate::identity::PeerId;

/// Rejections of an auction command or event.
///
/// Raised before any mutation; a rejected operation leaves the replica untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("auction '{0}' already exists")]
    DuplicateOpen(ItemId),
    #[error("no auction for item '{0}'")]
    UnknownItem(ItemId),
    #[error("peer {requester} may not close '{item_id}' owned by {owner}")]
    UnauthorizedClose {
        item_id: ItemId,
        owner: PeerId,
        requester: PeerId,
    },
    #[error("auction '{0}' is closed")]
    AuctionClosed(ItemId),
    #[error("bid {offered} on '{item_id}' is below the current price {current}")]
    BidTooLow {
        item_id: ItemId,
        current: Price,
        offered: Price,
    },
}

/// Failures talking to another process.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("peer {peer} unreachable: {reason}")]
    PeerUnreachable { peer: PeerId, reason: String },
    #[error("directory unreachable: {0}")]
    DirectoryUnreachable(String),
    #[error("request timed out after {0} ms")]
    Timeout(u64),
    #[error("protocol error: {0}")]
    Protocol(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_close_message_names_both_parties() {
        let e = CommandError::UnauthorizedClose {
            item_id: "X1".into(),
            owner: PeerId::from("alice"),
            requester: PeerId::from("mallory"),
        };
        let msg = e.to_string();
        assert!(msg.contains("alice"));
        assert!(msg.contains("mallory"));
        assert!(msg.contains("X1"));
    }
}
