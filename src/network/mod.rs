use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::raft::Peer;

pub mod client;
pub mod error;
pub mod http;
pub mod metrics;
pub mod server;

pub use client::{HttpTransport, RaftClient};
pub use error::NetworkError;
pub use server::ElectionServer;

/// Reply to a heartbeat. `accepted` is false when the heartbeat carried a
/// term older than the receiver's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatReply {
    pub term: u64,
    pub accepted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReply {
    pub term: u64,
    pub granted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl VoteReply {
    pub fn granted(term: u64) -> Self {
        Self {
            term,
            granted: true,
            reason: None,
        }
    }

    pub fn rejected(term: u64, reason: &str) -> Self {
        Self {
            term,
            granted: false,
            reason: Some(reason.to_string()),
        }
    }
}

/// Outcome of one RequestVote call, as seen by the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteResult {
    Granted,
    Rejected { term: u64 },
    Unreachable,
}

/// Wire used to reach other cluster members.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn heartbeat(
        &self,
        peer: &Peer,
        term: u64,
        leader: &str,
    ) -> Result<HeartbeatReply, NetworkError>;

    async fn request_vote(
        &self,
        peer: &Peer,
        term: u64,
        candidate: &str,
    ) -> Result<VoteReply, NetworkError>;
}
