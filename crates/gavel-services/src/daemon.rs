//! Process wiring for a node and for the presence directory.
//!
//! Both binaries and the integration tests start their components through
//! here, so the same listener, agent and timers run in every setting.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use gavel_core::config::TimingConfig;
use gavel_core::wire::HeartbeatAck;
use gavel_core::{PeerId, TransportError};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::agent::{spawn_agent, AgentHandle};
use crate::broadcast::FanOut;
use crate::clock::Clock;
use crate::net::{serve_rpc, DirectoryRpcHandler, PeerRpcHandler, TcpDirectoryClient, TcpPeerTransport};
use crate::node::NodeAgent;
use crate::presence::PresenceDirectory;
use crate::schedule::BackgroundTasks;
use crate::tasks::{
    refresh_membership, send_heartbeat, spawn_heartbeat, spawn_membership_refresh, spawn_sweep,
    TaskError,
};

// ── Node ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NodeSettings {
    pub identity: PeerId,
    pub listen_addr: String,
    /// Empty means announce the bound listen address.
    pub advertise_addr: String,
    pub directory_addr: String,
    pub timing: TimingConfig,
}

/// A started node: RPC listener, agent task, heartbeat and membership timers.
pub struct RunningNode {
    agent: AgentHandle,
    endpoint: String,
    directory: Arc<TcpDirectoryClient>,
    tasks: BackgroundTasks,
}

impl RunningNode {
    pub fn agent(&self) -> &AgentHandle {
        &self.agent
    }

    /// Address announced to the directory.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Shutdown receiver shared with every task of this node.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tasks.subscribe()
    }

    pub fn shutdown_sender(&self) -> broadcast::Sender<()> {
        self.tasks.shutdown_sender()
    }

    /// Heartbeat once, outside the timer.
    pub async fn heartbeat_now(&self, nonce: u64) -> Result<HeartbeatAck, TransportError> {
        send_heartbeat(self.directory.as_ref(), self.agent.identity(), &self.endpoint, nonce)
            .await
    }

    /// Refresh membership once, outside the timer.
    pub async fn refresh_now(&self) -> Result<usize, TaskError> {
        refresh_membership(self.directory.as_ref(), &self.agent).await
    }

    /// Stop every timer, the listener and the agent, and wait for them.
    pub async fn shutdown(self) {
        tracing::info!(peer = self.agent.identity().short(), "node shutting down");
        self.tasks.shutdown().await;
    }
}

pub async fn start_node(settings: NodeSettings) -> io::Result<RunningNode> {
    let listener = TcpListener::bind(&settings.listen_addr).await?;
    let bound: SocketAddr = listener.local_addr()?;
    let endpoint = if settings.advertise_addr.is_empty() {
        bound.to_string()
    } else {
        settings.advertise_addr.clone()
    };

    let timing = &settings.timing;
    let mut tasks = BackgroundTasks::new();

    let transport = Arc::new(TcpPeerTransport::new(timing.broadcast_timeout()));
    let fanout = FanOut::new(transport, timing.broadcast_timeout());
    let (agent, agent_task) = spawn_agent(NodeAgent::new(settings.identity.clone()), fanout, tasks.subscribe());
    tasks.track("agent", agent_task);

    let handler = Arc::new(PeerRpcHandler::new(agent.clone()));
    let rpc = tokio::spawn(serve_rpc(listener, handler, tasks.subscribe()));
    tasks.track("rpc", rpc);

    let directory = Arc::new(TcpDirectoryClient::new(
        settings.directory_addr.clone(),
        timing.broadcast_timeout(),
    ));
    spawn_heartbeat(
        &mut tasks,
        directory.clone(),
        settings.identity.clone(),
        endpoint.clone(),
        timing.heartbeat(),
    );
    spawn_membership_refresh(&mut tasks, directory.clone(), agent.clone(), timing.membership_refresh());

    tracing::info!(
        peer = settings.identity.short(),
        endpoint = %endpoint,
        directory = %settings.directory_addr,
        "node started"
    );

    Ok(RunningNode {
        agent,
        endpoint,
        directory,
        tasks,
    })
}

// ── Directory ─────────────────────────────────────────────────────────────────

/// A started presence directory: RPC listener and expiry sweep.
pub struct RunningDirectory {
    addr: SocketAddr,
    presence: PresenceDirectory,
    tasks: BackgroundTasks,
}

impl RunningDirectory {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn presence(&self) -> &PresenceDirectory {
        &self.presence
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tasks.subscribe()
    }

    pub fn shutdown_sender(&self) -> broadcast::Sender<()> {
        self.tasks.shutdown_sender()
    }

    pub async fn shutdown(self) {
        tracing::info!(addr = %self.addr, "directory shutting down");
        self.tasks.shutdown().await;
    }
}

pub async fn start_directory<C: Clock + Clone>(
    listen_addr: &str,
    timing: &TimingConfig,
    clock: C,
) -> io::Result<RunningDirectory> {
    let listener = TcpListener::bind(listen_addr).await?;
    let addr = listener.local_addr()?;

    let presence = PresenceDirectory::new(timing.peer_ttl());
    let mut tasks = BackgroundTasks::new();

    let handler = Arc::new(DirectoryRpcHandler::new(presence.clone(), clock.clone()));
    let rpc = tokio::spawn(serve_rpc(listener, handler, tasks.subscribe()));
    tasks.track("rpc", rpc);
    spawn_sweep(&mut tasks, presence.clone(), clock, timing.sweep());

    tracing::info!(
        addr = %addr,
        ttl_secs = timing.peer_ttl_secs,
        sweep_secs = timing.sweep_secs,
        "directory started"
    );

    Ok(RunningDirectory {
        addr,
        presence,
        tasks,
    })
}
