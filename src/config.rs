use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::raft::{PeerRegistry, RaftConfig, RaftError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listening address; also this node's identity inside `cluster`.
    pub address: String,
    /// Every member, self included.
    pub cluster: Vec<String>,
    pub raft: RaftConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8080".to_string(),
            cluster: vec![
                "127.0.0.1:8080".to_string(),
                "127.0.0.1:8081".to_string(),
                "127.0.0.1:8082".to_string(),
            ],
            raft: RaftConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RaftError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| RaftError::InvalidConfig(format!("{}: {e}", path.display())))
    }

    /// Splits a comma-separated member list.
    pub fn parse_cluster(list: &str) -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Checks timing and membership and returns the peer registry.
    pub fn validate(&self) -> Result<PeerRegistry, RaftError> {
        self.raft.validate()?;
        if self.cluster.is_empty() {
            return Err(RaftError::InvalidConfig("cluster list is empty".to_string()));
        }
        PeerRegistry::from_cluster(&self.address, &self.cluster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_default_values_are_sensible() {
        let cfg = Config::default();
        assert_eq!(cfg.address, "127.0.0.1:8080");
        assert_eq!(cfg.cluster.len(), 3);

        let peers = cfg.validate().expect("default config validates");
        assert_eq!(peers.peer_count(), 2);
        assert_eq!(peers.quorum(), 2);
    }

    #[test]
    fn parse_cluster_trims_and_skips_empty() {
        let members = Config::parse_cluster(" a:1, b:2 ,,c:3,");
        assert_eq!(members, vec!["a:1", "b:2", "c:3"]);
    }

    #[test]
    fn validate_rejects_empty_cluster() {
        let cfg = Config {
            cluster: vec![],
            ..Config::default()
        };
        assert!(matches!(cfg.validate(), Err(RaftError::InvalidConfig(_))));
    }

    #[test]
    fn validate_rejects_address_outside_cluster() {
        let cfg = Config {
            address: "127.0.0.1:9999".to_string(),
            ..Config::default()
        };
        assert!(matches!(cfg.validate(), Err(RaftError::UnknownSelf(_))));
    }

    #[test]
    fn loads_partial_json_file() {
        let mut file = NamedTempFile::new().expect("tempfile");
        write!(
            file,
            r#"{{"address":"10.0.0.2:7000","cluster":["10.0.0.1:7000","10.0.0.2:7000"],"raft":{{"rpc_timeout":50}}}}"#
        )
        .expect("write config");

        let cfg = Config::from_file(file.path()).expect("load config");
        assert_eq!(cfg.address, "10.0.0.2:7000");
        assert_eq!(cfg.raft.rpc_timeout, 50);
        assert_eq!(cfg.raft.heartbeat_interval, 500);

        let peers = cfg.validate().expect("valid");
        assert_eq!(peers.peers()[0].address(), "10.0.0.1:7000");
        assert_eq!(peers.quorum(), 2);
    }

    #[test]
    fn malformed_file_is_invalid_config() {
        let mut file = NamedTempFile::new().expect("tempfile");
        write!(file, "{{not json").expect("write");
        assert!(matches!(
            Config::from_file(file.path()),
            Err(RaftError::InvalidConfig(_))
        ));
    }
}
