use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hyper::client::HttpConnector;
use hyper::{Body, Client, StatusCode, Uri};
use log::debug;
use tokio::time::timeout;
use url::form_urlencoded;

use crate::raft::Peer;

use super::{metrics, HeartbeatReply, NetworkError, PeerTransport, VoteReply, VoteResult};

/// Outbound side of the election protocol. Every call is bounded by
/// `rpc_timeout`; no failure ever escapes as an error.
#[derive(Clone)]
pub struct RaftClient {
    transport: Arc<dyn PeerTransport>,
    rpc_timeout: Duration,
}

impl RaftClient {
    pub fn new(transport: Arc<dyn PeerTransport>, rpc_timeout: Duration) -> Self {
        Self {
            transport,
            rpc_timeout,
        }
    }

    pub async fn request_vote(&self, peer: &Peer, term: u64, candidate: &str) -> VoteResult {
        match timeout(
            self.rpc_timeout,
            self.transport.request_vote(peer, term, candidate),
        )
        .await
        {
            Ok(Ok(reply)) if reply.granted => VoteResult::Granted,
            Ok(Ok(reply)) => VoteResult::Rejected { term: reply.term },
            Ok(Err(e)) => {
                debug!("RequestVote to {peer} failed: {e}");
                metrics::record_unreachable();
                VoteResult::Unreachable
            }
            Err(_) => {
                debug!("RequestVote to {peer} timed out after {:?}", self.rpc_timeout);
                metrics::record_unreachable();
                VoteResult::Unreachable
            }
        }
    }

    /// Best effort: `None` if the peer could not be reached in time.
    pub async fn send_heartbeat(
        &self,
        peer: &Peer,
        term: u64,
        leader: &str,
    ) -> Option<HeartbeatReply> {
        let result = match timeout(self.rpc_timeout, self.transport.heartbeat(peer, term, leader))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(NetworkError::TimeoutError),
        };

        match result {
            Ok(reply) => {
                metrics::record_heartbeat_sent(true);
                Some(reply)
            }
            Err(e) => {
                debug!("Heartbeat to {peer} failed: {e}");
                metrics::record_heartbeat_sent(false);
                None
            }
        }
    }
}

/// `PeerTransport` over plain HTTP/1.1 GET requests with query parameters.
pub struct HttpTransport {
    client: Client<HttpConnector, Body>,
}

impl HttpTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));
        connector.set_nodelay(true);
        Self {
            client: Client::builder().build(connector),
        }
    }

    async fn get(
        &self,
        peer: &Peer,
        path: &str,
        term: u64,
        server: &str,
    ) -> Result<(StatusCode, hyper::body::Bytes), NetworkError> {
        let uri = rpc_uri(peer, path, term, server)?;
        let response = self.client.get(uri).await?;
        let status = response.status();
        let body = hyper::body::to_bytes(response.into_body()).await?;
        Ok((status, body))
    }
}

#[async_trait]
impl PeerTransport for HttpTransport {
    async fn heartbeat(
        &self,
        peer: &Peer,
        term: u64,
        leader: &str,
    ) -> Result<HeartbeatReply, NetworkError> {
        let (status, body) = self.get(peer, "heartbeat", term, leader).await?;
        if status != StatusCode::OK {
            return Err(NetworkError::UnexpectedStatus(status.as_u16()));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    async fn request_vote(
        &self,
        peer: &Peer,
        term: u64,
        candidate: &str,
    ) -> Result<VoteReply, NetworkError> {
        let (status, body) = self.get(peer, "requestVote", term, candidate).await?;
        match status {
            StatusCode::OK | StatusCode::CONFLICT => {
                let mut reply: VoteReply = serde_json::from_slice(&body)?;
                // The status code is authoritative.
                reply.granted = status == StatusCode::OK;
                Ok(reply)
            }
            other => Err(NetworkError::UnexpectedStatus(other.as_u16())),
        }
    }
}

/// Builds `http://<peer>/<path>?term=..&server=..`. Peers may be configured
/// with or without the `http://` scheme.
fn rpc_uri(peer: &Peer, path: &str, term: u64, server: &str) -> Result<Uri, NetworkError> {
    let base = peer.address().trim_end_matches('/');
    let base = if base.starts_with("http://") {
        base.to_string()
    } else {
        format!("http://{base}")
    };
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("term", &term.to_string())
        .append_pair("server", server)
        .finish();

    format!("{base}/{path}?{query}")
        .parse::<Uri>()
        .map_err(|e| NetworkError::InvalidUri(format!("{peer}: {e}")))
}
