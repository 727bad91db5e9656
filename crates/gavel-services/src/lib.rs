//! gavel-services: node and directory behaviour on top of gavel-core.
//!
//! The replica store and presence directory hold state; the agent task
//! serializes access to a node's state; `net` carries it over TCP.

pub mod agent;
pub mod broadcast;
pub mod clock;
pub mod daemon;
pub mod net;
pub mod node;
pub mod presence;
pub mod replica;
pub mod schedule;
pub mod tasks;
pub mod transport;

pub use agent::{spawn_agent, AgentError, AgentHandle, CommandReceipt};
pub use broadcast::{BroadcastReport, BroadcastTicket, FanOut};
pub use daemon::{start_directory, start_node, NodeSettings, RunningDirectory, RunningNode};
pub use clock::{Clock, ManualClock, SystemClock};
pub use node::{EventOutcome, NodeAgent, NodeSnapshot};
pub use presence::{PeerRecord, PresenceDirectory};
pub use replica::{BidRule, ReplicaStore};
pub use schedule::BackgroundTasks;
pub use transport::{DirectoryClient, PeerTransport};
