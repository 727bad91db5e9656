//! Broadcast fan-out: delivers one event to many peers independently.
//!
//! Each recipient gets its own task and its own timeout. A slow or dead
//! peer only ever costs its own task; failures are logged and reported,
//! never propagated to the command that produced the event.

use std::sync::Arc;
use std::time::Duration;

use gavel_core::wire::MemberInfo;
use gavel_core::{AuctionEvent, PeerId, TransportError};
use tokio::task::{JoinHandle, JoinSet};

use crate::transport::PeerTransport;

/// Per-peer results of one broadcast.
#[derive(Debug, Default, Clone)]
pub struct BroadcastReport {
    pub delivered: Vec<PeerId>,
    pub failed: Vec<(PeerId, String)>,
}

impl BroadcastReport {
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }
}

/// Handle to an in-flight broadcast.
pub struct BroadcastTicket {
    recipients: usize,
    handle: JoinHandle<BroadcastReport>,
}

impl BroadcastTicket {
    pub fn recipients(&self) -> usize {
        self.recipients
    }

    /// Wait until every per-peer delivery has finished or timed out.
    pub async fn finished(self) -> BroadcastReport {
        match self.handle.await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(error = %e, "broadcast supervisor failed");
                BroadcastReport::default()
            }
        }
    }
}

pub struct FanOut<T: PeerTransport> {
    transport: Arc<T>,
    timeout: Duration,
}

impl<T: PeerTransport> Clone for FanOut<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            timeout: self.timeout,
        }
    }
}

impl<T: PeerTransport> FanOut<T> {
    pub fn new(transport: Arc<T>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Start delivering `event` to every recipient. Returns immediately.
    pub fn dispatch(&self, event: AuctionEvent, recipients: Vec<MemberInfo>) -> BroadcastTicket {
        let count = recipients.len();
        let event = Arc::new(event);
        let mut set = JoinSet::new();

        for peer in recipients {
            let transport = self.transport.clone();
            let event = event.clone();
            let timeout = self.timeout;
            set.spawn(async move {
                let result =
                    match tokio::time::timeout(timeout, transport.deliver(&peer, &event)).await {
                        Ok(r) => r,
                        Err(_) => Err(TransportError::Timeout(timeout.as_millis() as u64)),
                    };
                (peer.identity, result)
            });
        }

        let handle = tokio::spawn(async move {
            let mut report = BroadcastReport::default();
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok((peer, Ok(()))) => {
                        tracing::trace!(peer = peer.short(), method = event.method(), "event delivered");
                        report.delivered.push(peer);
                    }
                    Ok((peer, Err(e))) => {
                        tracing::warn!(
                            peer = peer.short(),
                            method = event.method(),
                            item_id = event.item_id(),
                            error = %e,
                            "event delivery failed"
                        );
                        report.failed.push((peer, e.to_string()));
                    }
                    Err(e) => tracing::warn!(error = %e, "delivery task panicked"),
                }
            }
            if report.attempted() > 0 {
                tracing::debug!(
                    method = event.method(),
                    delivered = report.delivered.len(),
                    failed = report.failed.len(),
                    "broadcast finished"
                );
            }
            report
        });

        BroadcastTicket {
            recipients: count,
            handle,
        }
    }
}
