//! CLI command modules.

pub mod auctions;
pub mod http;
pub mod status;
