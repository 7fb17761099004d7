use std::sync::Arc;
use std::time::{Duration, Instant};

use ::log::{debug, error, info};
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::sleep;

use super::{ElectionState, NodeRole, PeerRegistry};
use crate::network::{metrics, RaftClient, VoteResult};

/// Periodic task that either asserts leadership or runs elections.
pub struct ElectionDriver {
    state: Arc<Mutex<ElectionState>>,
    peers: Arc<PeerRegistry>,
    client: RaftClient,
    heartbeat_interval: Duration,
}

impl ElectionDriver {
    pub fn new(
        state: Arc<Mutex<ElectionState>>,
        peers: Arc<PeerRegistry>,
        client: RaftClient,
        heartbeat_interval: Duration,
    ) -> Self {
        Self {
            state,
            peers,
            client,
            heartbeat_interval,
        }
    }

    pub async fn run(self) {
        loop {
            let wait = self.tick().await;
            sleep(wait).await;
        }
    }

    /// Runs one step of the driver and returns how long to sleep before the
    /// next one.
    pub async fn tick(&self) -> Duration {
        // Due check and candidacy share one lock acquisition.
        let candidacy = {
            let mut state = self.state.lock().await;
            if state.is_leader() {
                None
            } else {
                let until_election = state.time_until_election(Instant::now());
                if !until_election.is_zero() {
                    return until_election;
                }
                let Some(term) = state.become_candidate() else {
                    return state.time_until_election(Instant::now());
                };
                Some(term)
            }
        };

        let Some(term) = candidacy else {
            self.broadcast_heartbeats().await;
            return self.heartbeat_interval;
        };
        self.campaign(term).await;

        let state = self.state.lock().await;
        if state.is_leader() {
            self.heartbeat_interval
        } else {
            state.time_until_election(Instant::now())
        }
    }

    /// Runs one candidacy. Returns true if this node won the term.
    pub async fn run_election(&self) -> bool {
        let Some(term) = self.state.lock().await.become_candidate() else {
            return false;
        };
        self.campaign(term).await
    }

    async fn campaign(&self, term: u64) -> bool {
        metrics::record_election_started();

        let required = self.peers.quorum();
        let mut votes = 1usize;
        if votes >= required {
            return self.claim_leadership(term).await;
        }

        let candidate = self.peers.self_address().to_string();
        let mut requests = JoinSet::new();
        for peer in self.peers.peers().iter().cloned() {
            let client = self.client.clone();
            let candidate = candidate.clone();
            requests.spawn(async move {
                let result = client.request_vote(&peer, term, &candidate).await;
                (peer, result)
            });
        }

        let mut remaining = self.peers.peer_count();
        while let Some(joined) = requests.join_next().await {
            remaining -= 1;
            let (peer, result) = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("RequestVote task failed: {e}");
                    continue;
                }
            };

            let mut state = self.state.lock().await;
            match result {
                VoteResult::Granted => {
                    votes += 1;
                    info!("Received vote from {peer} for term {term}");
                }
                VoteResult::Rejected { term: peer_term } => {
                    info!("Didn't receive vote from {peer} for term {term}");
                    state.observe_term(peer_term);
                }
                VoteResult::Unreachable => {
                    debug!("No answer from {peer} for term {term}");
                }
            }

            if state.current_term() != term || state.role() != NodeRole::Candidate {
                info!(
                    "Election for term {} superseded (now term {}, {})",
                    term,
                    state.current_term(),
                    state.role()
                );
                return false;
            }
            drop(state);

            if votes >= required {
                return self.claim_leadership(term).await;
            }
            if votes + remaining < required {
                break;
            }
        }

        info!(
            "Election for term {} failed: {} of {} required votes",
            term, votes, required
        );
        false
    }

    async fn claim_leadership(&self, term: u64) -> bool {
        let won = self.state.lock().await.become_leader(term);
        if won {
            metrics::record_election_won();
            self.broadcast_heartbeats().await;
        }
        won
    }

    /// Sends one heartbeat to every peer without waiting for replies. Replies
    /// carrying a newer term demote this node.
    pub async fn broadcast_heartbeats(&self) -> Vec<JoinHandle<()>> {
        let term = {
            let state = self.state.lock().await;
            if !state.is_leader() {
                return Vec::new();
            }
            state.current_term()
        };

        let leader = self.peers.self_address().to_string();
        self.peers
            .peers()
            .iter()
            .cloned()
            .map(|peer| {
                let client = self.client.clone();
                let state = Arc::clone(&self.state);
                let leader = leader.clone();
                tokio::spawn(async move {
                    let Some(reply) = client.send_heartbeat(&peer, term, &leader).await else {
                        return;
                    };
                    if reply.term > term {
                        let mut state = state.lock().await;
                        if state.observe_term(reply.term) {
                            info!("{peer} is at term {}, no longer leading", reply.term);
                        }
                    }
                })
            })
            .collect()
    }
}
