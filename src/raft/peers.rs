use std::fmt;

use serde::{Deserialize, Serialize};

use super::RaftError;

/// Address of one other cluster member, e.g. `127.0.0.1:8081`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Peer(String);

impl Peer {
    pub fn new<T: Into<String>>(address: T) -> Self {
        Self(address.into())
    }

    pub fn address(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Static cluster membership as seen from one node: every member except self.
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct PeerRegistry {
    self_address: String,
    peers: Vec<Peer>,
}

impl PeerRegistry {
    /// Builds the registry from the full member list, which must contain
    /// `self_address` exactly once.
    pub fn from_cluster<I, S>(self_address: &str, cluster: I) -> Result<Self, RaftError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen_self = false;
        let mut peers: Vec<Peer> = Vec::new();

        for member in cluster {
            let member = member.as_ref().trim();
            if member.is_empty() {
                continue;
            }
            if member == self_address {
                if seen_self {
                    return Err(RaftError::InvalidConfig(format!(
                        "duplicate cluster member: {member}"
                    )));
                }
                seen_self = true;
                continue;
            }
            if peers.iter().any(|p| p.address() == member) {
                return Err(RaftError::InvalidConfig(format!(
                    "duplicate cluster member: {member}"
                )));
            }
            peers.push(Peer::new(member));
        }

        if !seen_self {
            return Err(RaftError::UnknownSelf(self_address.to_string()));
        }

        Ok(Self {
            self_address: self_address.to_string(),
            peers,
        })
    }

    pub fn self_address(&self) -> &str {
        &self.self_address
    }

    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Number of voting members, self included.
    pub fn cluster_size(&self) -> usize {
        self.peers.len() + 1
    }

    /// Smallest vote count strictly greater than half the cluster.
    pub fn quorum(&self) -> usize {
        self.cluster_size() / 2 + 1
    }
}
