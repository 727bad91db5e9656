//! Request handlers for the two RPC roles.

use gavel_core::wire::{HeartbeatAck, Membership, Request, Response};

use async_trait::async_trait;

use super::server::RequestHandler;
use crate::agent::AgentHandle;
use crate::clock::Clock;
use crate::presence::PresenceDirectory;

/// Node side: inbound auction events go to the agent task.
#[derive(Clone)]
pub struct PeerRpcHandler {
    agent: AgentHandle,
}

impl PeerRpcHandler {
    pub fn new(agent: AgentHandle) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl RequestHandler for PeerRpcHandler {
    async fn handle(&self, request: Request) -> Response {
        let method = request.method();
        let Some(event) = request.into_event() else {
            return Response::error(format!("{method} is not served by a node"));
        };
        match self.agent.deliver(event).await {
            // Rejected events are logged by the agent; the sender still gets an
            // ack since retrying would not change the outcome.
            Ok(_) => Response::Ack,
            Err(e) => Response::error(e.to_string()),
        }
    }
}

/// Directory side: heartbeats and membership queries.
pub struct DirectoryRpcHandler<C: Clock> {
    directory: PresenceDirectory,
    clock: C,
}

impl<C: Clock> DirectoryRpcHandler<C> {
    pub fn new(directory: PresenceDirectory, clock: C) -> Self {
        Self { directory, clock }
    }
}

#[async_trait]
impl<C: Clock> RequestHandler for DirectoryRpcHandler<C> {
    async fn handle(&self, request: Request) -> Response {
        match request {
            Request::Heartbeat(hb) => {
                let now = self.clock.now_ms();
                let skew = now.abs_diff(hb.timestamp);
                if skew > self.directory.ttl().as_millis() as u64 {
                    tracing::debug!(peer = hb.identity.short(), skew_ms = skew, "heartbeat clock skew");
                }
                let peer = hb.identity.clone();
                let status = self.directory.heartbeat(hb.identity, hb.endpoint, now);
                tracing::trace!(peer = peer.short(), ?status, "heartbeat");
                Response::Heartbeat(HeartbeatAck {
                    nonce: hb.nonce.wrapping_add(1),
                    status,
                })
            }
            Request::QueryMembership => Response::Membership(Membership {
                peers: self.directory.membership(self.clock.now_ms()),
            }),
            other => Response::error(format!("{} is not served by the directory", other.method())),
        }
    }
}
