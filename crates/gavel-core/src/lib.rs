//! gavel-core: shared types, wire format, identity and configuration.
//! All other Gavel crates depend on this one.

pub mod auction;
pub mod config;
pub mod error;
pub mod identity;
pub mod wire;

pub use auction::{AuctionEvent, AuctionRecord, AuctionStatus, ItemId, Price};
pub use error::{CommandError, TransportError};
pub use identity::PeerId;
