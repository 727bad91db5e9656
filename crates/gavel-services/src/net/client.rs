//! TCP side of the RPC: one connection per call, one frame each way.

use std::time::Duration;

use async_trait::async_trait;
use gavel_core::wire::{HeartbeatAck, HeartbeatRequest, MemberInfo, Request, Response};
use gavel_core::{AuctionEvent, TransportError};
use tokio::net::TcpStream;

use super::frame::{read_frame, write_frame};
use crate::transport::{DirectoryClient, PeerTransport};

/// Send `request` to `addr` and wait for the single response, bounded by `timeout`.
pub async fn call(addr: &str, request: &Request, timeout: Duration) -> Result<Response, TransportError> {
    let exchange = async {
        let mut stream = TcpStream::connect(addr)
            .await
            .map_err(|e| TransportError::Protocol(format!("connect {addr}: {e}")))?;
        write_frame(&mut stream, request).await?;
        read_frame::<_, Response>(&mut stream)
            .await?
            .ok_or_else(|| TransportError::Protocol("connection closed before response".into()))
    };
    match tokio::time::timeout(timeout, exchange).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(timeout.as_millis() as u64)),
    }
}

/// Peer-to-peer event delivery over TCP.
#[derive(Debug, Clone)]
pub struct TcpPeerTransport {
    timeout: Duration,
}

impl TcpPeerTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl PeerTransport for TcpPeerTransport {
    async fn deliver(&self, peer: &MemberInfo, event: &AuctionEvent) -> Result<(), TransportError> {
        let unreachable = |reason: String| TransportError::PeerUnreachable {
            peer: peer.identity.clone(),
            reason,
        };
        if peer.endpoint.is_empty() {
            return Err(unreachable("no endpoint advertised".into()));
        }

        let request = Request::from(event.clone());
        match call(&peer.endpoint, &request, self.timeout).await {
            Ok(Response::Ack) => Ok(()),
            Ok(Response::Error { message }) => Err(unreachable(format!("peer refused: {message}"))),
            Ok(other) => Err(TransportError::Protocol(format!("unexpected response {other:?}"))),
            Err(TransportError::Timeout(ms)) => Err(TransportError::Timeout(ms)),
            Err(e) => Err(unreachable(e.to_string())),
        }
    }
}

/// Node-side client for the presence directory.
#[derive(Debug, Clone)]
pub struct TcpDirectoryClient {
    addr: String,
    timeout: Duration,
}

impl TcpDirectoryClient {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn request(&self, request: Request) -> Result<Response, TransportError> {
        match call(&self.addr, &request, self.timeout).await {
            Ok(Response::Error { message }) => Err(TransportError::Protocol(message)),
            Ok(response) => Ok(response),
            Err(TransportError::Timeout(ms)) => Err(TransportError::Timeout(ms)),
            Err(e) => Err(TransportError::DirectoryUnreachable(e.to_string())),
        }
    }
}

#[async_trait]
impl DirectoryClient for TcpDirectoryClient {
    async fn heartbeat(&self, request: HeartbeatRequest) -> Result<HeartbeatAck, TransportError> {
        match self.request(Request::Heartbeat(request)).await? {
            Response::Heartbeat(ack) => Ok(ack),
            other => Err(TransportError::Protocol(format!("unexpected response {other:?}"))),
        }
    }

    async fn query_membership(&self) -> Result<Vec<MemberInfo>, TransportError> {
        match self.request(Request::QueryMembership).await? {
            Response::Membership(m) => Ok(m.peers),
            other => Err(TransportError::Protocol(format!("unexpected response {other:?}"))),
        }
    }
}
