use std::sync::Arc;

use log::{debug, info};
use tokio::sync::Mutex;

use crate::raft::{ElectionState, HeartbeatOutcome, NodeRole};

use super::{metrics, HeartbeatReply, VoteReply};

/// Inbound side of the election protocol, independent of the wire format.
#[derive(Clone)]
pub struct ElectionServer {
    state: Arc<Mutex<ElectionState>>,
}

impl ElectionServer {
    pub fn new(state: Arc<Mutex<ElectionState>>) -> Self {
        Self { state }
    }

    pub fn state(&self) -> Arc<Mutex<ElectionState>> {
        Arc::clone(&self.state)
    }

    pub async fn heartbeat(&self, term: u64, leader: &str) -> HeartbeatReply {
        let mut state = self.state.lock().await;
        let outcome = state.record_heartbeat(term, leader);
        if let HeartbeatOutcome::Accepted { demoted: true } = outcome {
            info!("Following {leader} at term {term}");
        }
        HeartbeatReply {
            term: state.current_term(),
            accepted: matches!(outcome, HeartbeatOutcome::Accepted { .. }),
        }
    }

    pub async fn request_vote(&self, term: u64, candidate: &str) -> VoteReply {
        let mut state = self.state.lock().await;
        debug!("{candidate} asking for vote on term {term}");

        let decision = state.try_grant_vote(term, candidate);
        metrics::record_vote(decision.is_granted());

        if decision.is_granted() {
            VoteReply::granted(state.current_term())
        } else {
            VoteReply::rejected(state.current_term(), decision.as_str())
        }
    }

    /// Role, term and known leader, read under one lock acquisition.
    pub async fn status(&self) -> (NodeRole, u64, Option<String>) {
        let state = self.state.lock().await;
        (
            state.role(),
            state.current_term(),
            state.leader().map(str::to_string),
        )
    }
}
