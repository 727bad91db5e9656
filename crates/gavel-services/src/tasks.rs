//! Periodic node and directory duties.
//!
//! Each duty is a single-step function plus a spawner that runs it on a
//! `BackgroundTasks` timer. Tests drive the single steps directly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gavel_core::wire::{HeartbeatAck, HeartbeatRequest};
use gavel_core::{PeerId, TransportError};
use thiserror::Error;

use crate::agent::{AgentError, AgentHandle};
use crate::clock::{self, Clock};
use crate::presence::PresenceDirectory;
use crate::schedule::BackgroundTasks;
use crate::transport::DirectoryClient;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// Announce this node once. The ack must echo `nonce + 1`.
pub async fn send_heartbeat<D: DirectoryClient>(
    client: &D,
    identity: &PeerId,
    endpoint: &str,
    nonce: u64,
) -> Result<HeartbeatAck, TransportError> {
    let ack = client
        .heartbeat(HeartbeatRequest {
            identity: identity.clone(),
            endpoint: endpoint.to_string(),
            nonce,
            timestamp: clock::now_ms(),
        })
        .await?;
    let expected = nonce.wrapping_add(1);
    if ack.nonce != expected {
        return Err(TransportError::Protocol(format!(
            "heartbeat ack nonce {} (expected {expected})",
            ack.nonce
        )));
    }
    Ok(ack)
}

/// Pull membership from the directory into the agent. On failure the agent
/// keeps its previous snapshot. Returns the number of peers installed.
pub async fn refresh_membership<D: DirectoryClient>(
    client: &D,
    agent: &AgentHandle,
) -> Result<usize, TaskError> {
    let peers = client.query_membership().await?;
    let count = peers.len();
    agent.replace_peers(peers).await?;
    Ok(count)
}

/// Evict stale peers once.
pub fn sweep_once<C: Clock>(directory: &PresenceDirectory, clock: &C) -> Vec<PeerId> {
    directory.sweep(clock.now_ms())
}

pub fn spawn_heartbeat<D: DirectoryClient>(
    tasks: &mut BackgroundTasks,
    client: Arc<D>,
    identity: PeerId,
    endpoint: String,
    period: Duration,
) {
    let nonce = Arc::new(AtomicU64::new(0));
    tasks.spawn_periodic("heartbeat", period, move || {
        let client = client.clone();
        let identity = identity.clone();
        let endpoint = endpoint.clone();
        let nonce = nonce.fetch_add(1, Ordering::Relaxed);
        async move {
            match send_heartbeat(client.as_ref(), &identity, &endpoint, nonce).await {
                Ok(ack) => tracing::trace!(status = ?ack.status, "heartbeat acknowledged"),
                Err(e) => tracing::warn!(error = %e, "heartbeat failed"),
            }
        }
    });
}

pub fn spawn_membership_refresh<D: DirectoryClient>(
    tasks: &mut BackgroundTasks,
    client: Arc<D>,
    agent: AgentHandle,
    period: Duration,
) {
    tasks.spawn_periodic("membership", period, move || {
        let client = client.clone();
        let agent = agent.clone();
        async move {
            match refresh_membership(client.as_ref(), &agent).await {
                Ok(count) => tracing::trace!(peers = count, "membership refreshed"),
                Err(e) => tracing::warn!(error = %e, "membership refresh failed, keeping previous peers"),
            }
        }
    });
}

pub fn spawn_sweep<C: Clock>(
    tasks: &mut BackgroundTasks,
    directory: PresenceDirectory,
    clock: C,
    period: Duration,
) {
    tasks.spawn_periodic("sweep", period, move || {
        let evicted = sweep_once(&directory, &clock);
        if !evicted.is_empty() {
            tracing::debug!(evicted = evicted.len(), remaining = directory.len(), "sweep finished");
        }
        std::future::ready(())
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gavel_core::wire::{MemberInfo, PresenceStatus};
    use std::sync::Mutex;
    use tokio::sync::broadcast;

    use crate::broadcast::FanOut;
    use crate::clock::ManualClock;
    use crate::node::NodeAgent;
    use crate::transport::PeerTransport;

    /// In-memory directory with a switch to simulate an outage.
    struct FakeDirectory {
        presence: PresenceDirectory,
        clock: ManualClock,
        down: Mutex<bool>,
        skew_nonce: bool,
    }

    impl FakeDirectory {
        fn new(clock: ManualClock) -> Self {
            Self {
                presence: PresenceDirectory::new(Duration::from_secs(30)),
                clock,
                down: Mutex::new(false),
                skew_nonce: false,
            }
        }

        fn check(&self) -> Result<(), TransportError> {
            if *self.down.lock().unwrap() {
                return Err(TransportError::DirectoryUnreachable("down".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl DirectoryClient for FakeDirectory {
        async fn heartbeat(&self, request: HeartbeatRequest) -> Result<HeartbeatAck, TransportError> {
            self.check()?;
            let status =
                self.presence
                    .heartbeat(request.identity, request.endpoint, self.clock.now_ms());
            let bump = if self.skew_nonce { 2 } else { 1 };
            Ok(HeartbeatAck {
                nonce: request.nonce + bump,
                status,
            })
        }

        async fn query_membership(&self) -> Result<Vec<MemberInfo>, TransportError> {
            self.check()?;
            Ok(self.presence.membership(self.clock.now_ms()))
        }
    }

    struct NullTransport;

    #[async_trait]
    impl PeerTransport for NullTransport {
        async fn deliver(
            &self,
            _peer: &MemberInfo,
            _event: &gavel_core::AuctionEvent,
        ) -> Result<(), TransportError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn heartbeat_checks_echoed_nonce() {
        let dir = FakeDirectory::new(ManualClock::new(0));
        let id = PeerId::from("p1");
        let ack = send_heartbeat(&dir, &id, "p1:1", 126).await.unwrap();
        assert_eq!(ack.nonce, 127);
        assert_eq!(ack.status, PresenceStatus::Added);

        let mut skewed = FakeDirectory::new(ManualClock::new(0));
        skewed.skew_nonce = true;
        assert!(matches!(
            send_heartbeat(&skewed, &id, "p1:1", 1).await,
            Err(TransportError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_peers() {
        let clock = ManualClock::new(0);
        let dir = FakeDirectory::new(clock.clone());
        dir.presence.heartbeat(PeerId::from("a"), "a:1".into(), 0);
        dir.presence.heartbeat(PeerId::from("b"), "b:1".into(), 0);

        let (_stop, rx) = broadcast::channel(1);
        let (agent, _task) = crate::agent::spawn_agent(
            NodeAgent::new(PeerId::from("a")),
            FanOut::new(Arc::new(NullTransport), Duration::from_secs(1)),
            rx,
        );

        assert_eq!(refresh_membership(&dir, &agent).await.unwrap(), 2);

        *dir.down.lock().unwrap() = true;
        assert!(matches!(
            refresh_membership(&dir, &agent).await,
            Err(TaskError::Transport(_))
        ));
        assert_eq!(agent.snapshot().await.unwrap().known_peers.len(), 2);
    }

    #[test]
    fn sweep_once_evicts_only_expired_peers() {
        let clock = ManualClock::new(0);
        let directory = PresenceDirectory::new(Duration::from_secs(30));
        directory.heartbeat(PeerId::from("old"), String::new(), 0);
        directory.heartbeat(PeerId::from("new"), String::new(), 40_000);

        clock.set(61_000);
        assert_eq!(sweep_once(&directory, &clock), vec![PeerId::from("old")]);
        assert!(directory.get(&PeerId::from("new")).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_loop_registers_node() {
        let dir = Arc::new(FakeDirectory::new(ManualClock::new(0)));
        let mut tasks = BackgroundTasks::new();
        spawn_heartbeat(
            &mut tasks,
            dir.clone(),
            PeerId::from("p1"),
            "p1:1".into(),
            Duration::from_secs(5),
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(dir.presence.get(&PeerId::from("p1")).is_some());
        tasks.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn membership_loop_installs_peers_each_period() {
        let dir = Arc::new(FakeDirectory::new(ManualClock::new(0)));
        let (_stop, rx) = broadcast::channel(1);
        let (agent, _task) = crate::agent::spawn_agent(
            NodeAgent::new(PeerId::from("self")),
            FanOut::new(Arc::new(NullTransport), Duration::from_secs(1)),
            rx,
        );
        let mut tasks = BackgroundTasks::new();
        spawn_membership_refresh(&mut tasks, dir.clone(), agent.clone(), Duration::from_secs(10));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(agent.snapshot().await.unwrap().known_peers.is_empty());

        dir.presence.heartbeat(PeerId::from("a"), "a:1".into(), 0);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(agent.snapshot().await.unwrap().known_peers.is_empty());

        tokio::time::sleep(Duration::from_secs(5)).await;
        let peers = agent.snapshot().await.unwrap().known_peers;
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].identity, PeerId::from("a"));
        tasks.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_loop_evicts_on_its_tick() {
        let clock = ManualClock::new(0);
        let directory = PresenceDirectory::new(Duration::from_secs(30));
        directory.heartbeat(PeerId::from("old"), String::new(), 0);

        let mut tasks = BackgroundTasks::new();
        spawn_sweep(&mut tasks, directory.clone(), clock.clone(), Duration::from_secs(30));

        // First tick runs at once while the record is still fresh.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(directory.len(), 1);

        clock.set(61_000);
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(directory.len(), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(directory.is_empty());
        tasks.shutdown().await;
    }
}
