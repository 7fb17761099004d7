mod config;
mod driver;
mod error;
mod peers;
mod state;
mod timer;

pub use self::config::RaftConfig;
pub use self::driver::ElectionDriver;
pub use self::error::RaftError;
pub use self::peers::{Peer, PeerRegistry};
pub use self::state::{ElectionState, HeartbeatOutcome, NodeRole, VoteDecision, VoteLedger};
pub use self::timer::ElectionTimer;

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::network::{ElectionServer, PeerTransport, RaftClient};

// Main election service
pub struct Raft {
    pub state: Arc<Mutex<ElectionState>>,
    peers: Arc<PeerRegistry>,
    config: RaftConfig,
}

impl Raft {
    pub fn new(peers: PeerRegistry, config: RaftConfig) -> Self {
        let state = ElectionState::new(peers.self_address(), ElectionTimer::from_config(&config));
        Self {
            state: Arc::new(Mutex::new(state)),
            peers: Arc::new(peers),
            config,
        }
    }

    pub fn config(&self) -> &RaftConfig {
        &self.config
    }

    pub fn peers(&self) -> &PeerRegistry {
        &self.peers
    }

    /// Inbound handlers bound to this node's state.
    pub fn server(&self) -> ElectionServer {
        ElectionServer::new(Arc::clone(&self.state))
    }

    pub fn driver(&self, transport: Arc<dyn PeerTransport>) -> ElectionDriver {
        ElectionDriver::new(
            Arc::clone(&self.state),
            Arc::clone(&self.peers),
            RaftClient::new(transport, self.config.rpc_timeout()),
            self.config.heartbeat_interval(),
        )
    }

    /// Spawns the heartbeat/election loop.
    pub fn start(&self, transport: Arc<dyn PeerTransport>) -> JoinHandle<()> {
        let driver = self.driver(transport);
        tokio::spawn(driver.run())
    }
}
