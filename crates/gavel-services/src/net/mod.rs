//! TCP RPC: framing, client transports and the accept loop.

pub mod client;
pub mod frame;
pub mod handlers;
pub mod server;

pub use client::{call, TcpDirectoryClient, TcpPeerTransport};
pub use handlers::{DirectoryRpcHandler, PeerRpcHandler};
pub use server::{serve_rpc, RequestHandler};
