//! Presence directory: tracks which peers are live and answers membership queries.
//!
//! Peers join by heartbeating and stay as long as heartbeats keep arriving.
//! There is no leave message: the expiry sweep is the only removal path.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use gavel_core::wire::{MemberInfo, PresenceStatus};
use gavel_core::PeerId;

/// Tracked state for a live peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerRecord {
    pub identity: PeerId,
    /// Where the peer accepts RPC.
    pub endpoint: String,
    /// Unix ms of the last heartbeat.
    pub last_seen: u64,
}

impl PeerRecord {
    fn is_stale(&self, now_ms: u64, ttl: Duration) -> bool {
        now_ms.saturating_sub(self.last_seen) > ttl.as_millis() as u64
    }

    fn member_info(&self) -> MemberInfo {
        MemberInfo {
            identity: self.identity.clone(),
            endpoint: self.endpoint.clone(),
            last_heartbeat: self.last_seen,
        }
    }
}

/// The live-peer registry. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct PresenceDirectory {
    peers: Arc<DashMap<PeerId, PeerRecord>>,
    ttl: Duration,
}

impl PresenceDirectory {
    pub fn new(ttl: Duration) -> Self {
        Self {
            peers: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Insert or refresh a peer. Idempotent.
    pub fn heartbeat(&self, identity: PeerId, endpoint: String, seen_ms: u64) -> PresenceStatus {
        match self.peers.entry(identity) {
            dashmap::mapref::entry::Entry::Occupied(mut e) => {
                let record = e.get_mut();
                record.last_seen = seen_ms;
                record.endpoint = endpoint;
                PresenceStatus::Exists
            }
            dashmap::mapref::entry::Entry::Vacant(e) => {
                tracing::info!(peer = e.key().short(), %endpoint, "peer joined");
                let identity = e.key().clone();
                e.insert(PeerRecord {
                    identity,
                    endpoint,
                    last_seen: seen_ms,
                });
                PresenceStatus::Added
            }
        }
    }

    /// Point-in-time list of live peers, sorted by identity.
    ///
    /// Records already past the TTL are left out even if the sweep
    /// has not run yet.
    pub fn membership(&self, now_ms: u64) -> Vec<MemberInfo> {
        let mut peers: Vec<MemberInfo> = self
            .peers
            .iter()
            .filter(|e| !e.value().is_stale(now_ms, self.ttl))
            .map(|e| e.value().member_info())
            .collect();
        peers.sort_by(|a, b| a.identity.cmp(&b.identity));
        peers
    }

    /// Evict every record older than the TTL. Returns the evicted identities.
    pub fn sweep(&self, now_ms: u64) -> Vec<PeerId> {
        let mut evicted = Vec::new();
        self.peers.retain(|id, record| {
            if record.is_stale(now_ms, self.ttl) {
                evicted.push(id.clone());
                false
            } else {
                true
            }
        });
        for id in &evicted {
            tracing::info!(peer = id.short(), "peer expired");
        }
        evicted
    }

    pub fn get(&self, identity: &PeerId) -> Option<PeerRecord> {
        self.peers.get(identity).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
