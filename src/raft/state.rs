use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use ::log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::ElectionTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    Follower,
    Candidate,
    Leader,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRole::Follower => write!(f, "Follower"),
            NodeRole::Candidate => write!(f, "Candidate"),
            NodeRole::Leader => write!(f, "Leader"),
        }
    }
}

/// Votes granted by this node, keyed by term. An entry is never overwritten
/// or removed.
#[derive(Debug, Default, Clone)]
pub struct VoteLedger {
    granted: BTreeMap<u64, String>,
}

impl VoteLedger {
    pub fn voted_in(&self, term: u64) -> Option<&str> {
        self.granted.get(&term).map(String::as_str)
    }

    /// Records a grant for `term`; returns false if one already exists.
    fn record(&mut self, term: u64, candidate: &str) -> bool {
        if self.granted.contains_key(&term) {
            return false;
        }
        self.granted.insert(term, candidate.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.granted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.granted.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatOutcome {
    /// The heartbeat reset the election timer. `demoted` is set when its term
    /// was higher than ours.
    Accepted { demoted: bool },
    /// Term below ours: acknowledged, but nothing changed.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDecision {
    Granted,
    StaleTerm,
    AlreadyVoted,
}

impl VoteDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, VoteDecision::Granted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VoteDecision::Granted => "granted",
            VoteDecision::StaleTerm => "stale_term",
            VoteDecision::AlreadyVoted => "already_voted",
        }
    }
}

/// Term, role, vote ledger and heartbeat clock of one node.
///
/// Shared as `Arc<Mutex<ElectionState>>`; every method below is a complete
/// transition and must run under a single lock acquisition.
#[derive(Debug)]
pub struct ElectionState {
    self_address: String,
    current_term: u64,
    role: NodeRole,
    leader: Option<String>,
    votes: VoteLedger,
    last_heartbeat: Option<Instant>,
    // Last point the election timer was re-armed: accepted heartbeat, granted
    // vote, or own candidacy.
    armed_at: Option<Instant>,
    timer: ElectionTimer,
    election_timeout: Duration,
}

impl ElectionState {
    pub fn new(self_address: &str, timer: ElectionTimer) -> Self {
        Self {
            self_address: self_address.to_string(),
            current_term: 0,
            role: NodeRole::Follower,
            leader: None,
            votes: VoteLedger::default(),
            last_heartbeat: None,
            armed_at: None,
            election_timeout: timer.draw(),
            timer,
        }
    }

    pub fn self_address(&self) -> &str {
        &self.self_address
    }

    pub fn current_term(&self) -> u64 {
        self.current_term
    }

    pub fn role(&self) -> NodeRole {
        self.role
    }

    pub fn is_leader(&self) -> bool {
        matches!(self.role, NodeRole::Leader)
    }

    pub fn leader(&self) -> Option<&str> {
        self.leader.as_deref()
    }

    pub fn votes(&self) -> &VoteLedger {
        &self.votes
    }

    pub fn last_heartbeat(&self) -> Option<Instant> {
        self.last_heartbeat
    }

    pub fn election_timeout(&self) -> Duration {
        self.election_timeout
    }

    /// Adopts `term` if it is newer than ours and falls back to Follower.
    /// Returns true when the term advanced.
    pub fn observe_term(&mut self, term: u64) -> bool {
        if term <= self.current_term {
            return false;
        }
        if self.role != NodeRole::Follower {
            info!(
                "Stepping down from {} to Follower: term {} -> {}",
                self.role, self.current_term, term
            );
        } else {
            debug!("Adopting term {} (was {})", term, self.current_term);
        }
        let was_leader = self.is_leader();
        self.current_term = term;
        self.role = NodeRole::Follower;
        self.leader = None;
        if was_leader {
            // Deposed leaders have no heartbeat to measure from.
            self.rearm(Instant::now());
        }
        true
    }

    pub fn record_heartbeat(&mut self, term: u64, leader: &str) -> HeartbeatOutcome {
        if term < self.current_term {
            debug!(
                "Ignoring stale heartbeat from {} (term {} < {})",
                leader, term, self.current_term
            );
            return HeartbeatOutcome::Stale;
        }

        let demoted = self.observe_term(term);
        match self.role {
            NodeRole::Candidate => {
                info!("{leader} already leads term {term}, abandoning candidacy");
                self.role = NodeRole::Follower;
            }
            NodeRole::Leader => {
                warn!("{leader} also claims term {term}, stepping down");
                self.role = NodeRole::Follower;
            }
            NodeRole::Follower => {}
        }

        if self.leader.as_deref() != Some(leader) {
            info!("New leader is {} for term {}", leader, term);
            self.leader = Some(leader.to_string());
        }

        let now = Instant::now();
        self.last_heartbeat = Some(now);
        self.rearm(now);

        HeartbeatOutcome::Accepted { demoted }
    }

    pub fn try_grant_vote(&mut self, term: u64, candidate: &str) -> VoteDecision {
        if term < self.current_term {
            return VoteDecision::StaleTerm;
        }
        self.observe_term(term);

        if !self.votes.record(term, candidate) {
            debug!(
                "Refusing vote to {} for term {}: already voted for {:?}",
                candidate,
                term,
                self.votes.voted_in(term)
            );
            return VoteDecision::AlreadyVoted;
        }

        info!("Vote given to {} for term {}", candidate, term);
        self.rearm(Instant::now());
        VoteDecision::Granted
    }

    /// Starts a new term with a self-vote and returns it. Returns `None`, and
    /// stays put with a re-armed timer, once the term space is exhausted.
    pub fn become_candidate(&mut self) -> Option<u64> {
        let Some(next) = self.current_term.checked_add(1) else {
            warn!(
                "Term {} cannot be incremented, not calling an election",
                self.current_term
            );
            self.rearm(Instant::now());
            return None;
        };
        self.current_term = next;
        self.role = NodeRole::Candidate;
        self.leader = None;
        let own = self.self_address.clone();
        let recorded = self.votes.record(self.current_term, &own);
        debug_assert!(recorded, "vote ledger already holds the new term");
        self.rearm(Instant::now());
        info!("Calling election for term {}", self.current_term);
        Some(self.current_term)
    }

    /// Promotes a candidate that is still contesting `term`. Returns false if
    /// the node moved on in the meantime.
    pub fn become_leader(&mut self, term: u64) -> bool {
        if self.current_term != term || self.role != NodeRole::Candidate {
            debug!(
                "Dropping stale win for term {} (now term {}, {})",
                term, self.current_term, self.role
            );
            return false;
        }
        self.role = NodeRole::Leader;
        self.leader = Some(self.self_address.clone());
        info!("I am Leader now for term {}", term);
        true
    }

    /// True if no heartbeat or vote activity happened within the current
    /// election timeout (or none ever did).
    pub fn election_due(&self, now: Instant) -> bool {
        self.time_until_election(now).is_zero()
    }

    pub fn time_until_election(&self, now: Instant) -> Duration {
        match self.armed_at {
            Some(at) => (at + self.election_timeout).saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }

    fn rearm(&mut self, now: Instant) {
        self.armed_at = Some(now);
        self.election_timeout = self.timer.draw();
    }
}
