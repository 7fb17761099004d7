use std::sync::atomic::{AtomicU64, Ordering};

pub static ELECTIONS_STARTED: AtomicU64 = AtomicU64::new(0);
pub static ELECTIONS_WON: AtomicU64 = AtomicU64::new(0);
pub static VOTES_GRANTED: AtomicU64 = AtomicU64::new(0);
pub static VOTES_REJECTED: AtomicU64 = AtomicU64::new(0);
pub static HEARTBEATS_SENT: AtomicU64 = AtomicU64::new(0);
pub static HEARTBEATS_FAILED: AtomicU64 = AtomicU64::new(0);
pub static PEER_UNREACHABLE: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElectionMetrics {
    pub elections_started: u64,
    pub elections_won: u64,
    pub votes_granted: u64,
    pub votes_rejected: u64,
    pub heartbeats_sent: u64,
    pub heartbeats_failed: u64,
    pub peer_unreachable: u64,
}

pub fn record_election_started() {
    ELECTIONS_STARTED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_election_won() {
    ELECTIONS_WON.fetch_add(1, Ordering::Relaxed);
}

/// Counts an inbound vote decision made by this node.
pub fn record_vote(granted: bool) {
    if granted {
        VOTES_GRANTED.fetch_add(1, Ordering::Relaxed);
    } else {
        VOTES_REJECTED.fetch_add(1, Ordering::Relaxed);
    }
}

pub fn record_heartbeat_sent(delivered: bool) {
    if delivered {
        HEARTBEATS_SENT.fetch_add(1, Ordering::Relaxed);
    } else {
        HEARTBEATS_FAILED.fetch_add(1, Ordering::Relaxed);
    }
}

pub fn record_unreachable() {
    PEER_UNREACHABLE.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> ElectionMetrics {
    ElectionMetrics {
        elections_started: ELECTIONS_STARTED.load(Ordering::Relaxed),
        elections_won: ELECTIONS_WON.load(Ordering::Relaxed),
        votes_granted: VOTES_GRANTED.load(Ordering::Relaxed),
        votes_rejected: VOTES_REJECTED.load(Ordering::Relaxed),
        heartbeats_sent: HEARTBEATS_SENT.load(Ordering::Relaxed),
        heartbeats_failed: HEARTBEATS_FAILED.load(Ordering::Relaxed),
        peer_unreachable: PEER_UNREACHABLE.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_only_grow() {
        let before = snapshot();
        record_election_started();
        record_vote(true);
        record_vote(false);
        record_heartbeat_sent(false);
        let after = snapshot();

        assert!(after.elections_started > before.elections_started);
        assert!(after.votes_granted > before.votes_granted);
        assert!(after.votes_rejected > before.votes_rejected);
        assert!(after.heartbeats_failed > before.heartbeats_failed);
    }
}
