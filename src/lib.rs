// Election core
pub mod raft;
pub mod config;

// Transport
pub mod network;

// Public exports
pub use config::Config;
pub use network::{ElectionServer, HttpTransport, PeerTransport, RaftClient, VoteResult};
pub use raft::{ElectionState, NodeRole, PeerRegistry, Raft, RaftConfig, RaftError};
