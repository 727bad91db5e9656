//! Agent task: the single serialization point for one node's state.
//!
//! Operator commands, inbound peer events and membership refreshes all
//! arrive as messages on one queue. The task applies them one at a time
//! to its `NodeAgent`, so nothing else ever touches the replica or the
//! known-peer list. Broadcasts are handed to the fan-out after the local
//! commit and are never awaited here.

use gavel_core::wire::MemberInfo;
use gavel_core::{AuctionEvent, AuctionRecord, CommandError, ItemId, PeerId, Price};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::broadcast::{BroadcastTicket, FanOut};
use crate::node::{Committed, EventOutcome, NodeAgent, NodeSnapshot};
use crate::transport::PeerTransport;

/// Depth of the agent's request queue.
const QUEUE_DEPTH: usize = 256;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("node agent has stopped")]
    Stopped,
}

/// Result of a successful local command.
pub struct CommandReceipt {
    pub record: AuctionRecord,
    pub broadcast: BroadcastTicket,
}

enum Command {
    Open { item_id: ItemId, start_price: Price },
    Bid { item_id: ItemId, price: Price },
    Close { item_id: ItemId },
}

enum AgentRequest {
    Command {
        command: Command,
        reply: oneshot::Sender<Result<CommandReceipt, CommandError>>,
    },
    Event {
        event: AuctionEvent,
        reply: oneshot::Sender<EventOutcome>,
    },
    ReplacePeers(Vec<MemberInfo>),
    Get(ItemId, oneshot::Sender<Option<AuctionRecord>>),
    Snapshot(oneshot::Sender<NodeSnapshot>),
}

/// Cloneable front door to a running agent task.
#[derive(Clone)]
pub struct AgentHandle {
    identity: PeerId,
    tx: mpsc::Sender<AgentRequest>,
}

impl AgentHandle {
    pub fn identity(&self) -> &PeerId {
        &self.identity
    }

    pub async fn open_auction(
        &self,
        item_id: impl Into<ItemId>,
        start_price: Price,
    ) -> Result<CommandReceipt, AgentError> {
        self.command(Command::Open {
            item_id: item_id.into(),
            start_price,
        })
        .await
    }

    pub async fn place_bid(
        &self,
        item_id: impl Into<ItemId>,
        price: Price,
    ) -> Result<CommandReceipt, AgentError> {
        self.command(Command::Bid {
            item_id: item_id.into(),
            price,
        })
        .await
    }

    pub async fn close_auction(
        &self,
        item_id: impl Into<ItemId>,
    ) -> Result<CommandReceipt, AgentError> {
        self.command(Command::Close {
            item_id: item_id.into(),
        })
        .await
    }

    /// Apply an event received from a peer.
    pub async fn deliver(&self, event: AuctionEvent) -> Result<EventOutcome, AgentError> {
        let (reply, rx) = oneshot::channel();
        self.send(AgentRequest::Event { event, reply }).await?;
        rx.await.map_err(|_| AgentError::Stopped)
    }

    /// Replace the known-peer snapshot.
    pub async fn replace_peers(&self, peers: Vec<MemberInfo>) -> Result<(), AgentError> {
        self.send(AgentRequest::ReplacePeers(peers)).await
    }

    /// One record by item id.
    pub async fn get(&self, item_id: impl Into<ItemId>) -> Result<Option<AuctionRecord>, AgentError> {
        let (reply, rx) = oneshot::channel();
        self.send(AgentRequest::Get(item_id.into(), reply)).await?;
        rx.await.map_err(|_| AgentError::Stopped)
    }

    pub async fn snapshot(&self) -> Result<NodeSnapshot, AgentError> {
        let (reply, rx) = oneshot::channel();
        self.send(AgentRequest::Snapshot(reply)).await?;
        rx.await.map_err(|_| AgentError::Stopped)
    }

    async fn command(&self, command: Command) -> Result<CommandReceipt, AgentError> {
        let (reply, rx) = oneshot::channel();
        self.send(AgentRequest::Command { command, reply }).await?;
        Ok(rx.await.map_err(|_| AgentError::Stopped)??)
    }

    async fn send(&self, request: AgentRequest) -> Result<(), AgentError> {
        self.tx.send(request).await.map_err(|_| AgentError::Stopped)
    }
}

/// Spawn the agent task. It runs until `shutdown` fires or every handle is dropped.
pub fn spawn_agent<T: PeerTransport>(
    node: NodeAgent,
    fanout: FanOut<T>,
    shutdown: broadcast::Receiver<()>,
) -> (AgentHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
    let handle = AgentHandle {
        identity: node.identity().clone(),
        tx,
    };
    let task = tokio::spawn(run(node, fanout, rx, shutdown));
    (handle, task)
}

async fn run<T: PeerTransport>(
    mut node: NodeAgent,
    fanout: FanOut<T>,
    mut rx: mpsc::Receiver<AgentRequest>,
    mut shutdown: broadcast::Receiver<()>,
) {
    tracing::info!(peer = node.identity().short(), "node agent started");
    loop {
        let request = tokio::select! {
            _ = shutdown.recv() => break,
            r = rx.recv() => match r {
                Some(r) => r,
                None => break,
            },
        };

        match request {
            AgentRequest::Command { command, reply } => {
                let result = match command {
                    Command::Open {
                        item_id,
                        start_price,
                    } => node.open_auction(item_id, start_price),
                    Command::Bid { item_id, price } => node.place_bid(item_id, price),
                    Command::Close { item_id } => node.close_auction(item_id),
                };
                let receipt = result.map(
                    |Committed {
                         record,
                         event,
                         recipients,
                     }| CommandReceipt {
                        record,
                        broadcast: fanout.dispatch(event, recipients),
                    },
                );
                if let Err(e) = &receipt {
                    tracing::debug!(error = %e, "command rejected");
                }
                let _ = reply.send(receipt);
            }
            AgentRequest::Event { event, reply } => {
                let _ = reply.send(node.apply_event(&event));
            }
            AgentRequest::ReplacePeers(peers) => node.replace_known_peers(peers),
            AgentRequest::Get(item_id, reply) => {
                let _ = reply.send(node.replica().get(&item_id).cloned());
            }
            AgentRequest::Snapshot(reply) => {
                let _ = reply.send(node.snapshot());
            }
        }
    }
    tracing::info!(peer = node.identity().short(), "node agent stopped");
}
