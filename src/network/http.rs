use std::convert::Infallible;
use std::net::{SocketAddr, TcpListener};

use hyper::header::{self, HeaderValue};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, StatusCode};
use log::info;
use serde::Serialize;
use url::form_urlencoded;

use crate::raft::{NodeRole, RaftError};

use super::{metrics, ElectionServer};

/// Binds the listening socket. Failure here is the only fatal startup error.
pub fn bind(addr: &str) -> Result<TcpListener, RaftError> {
    TcpListener::bind(addr).map_err(|source| RaftError::Bind {
        addr: addr.to_string(),
        source,
    })
}

/// Serves the election endpoints plus `/health` and `/metrics` until the
/// listener fails.
pub async fn run_http(listener: TcpListener, server: ElectionServer) -> Result<(), RaftError> {
    let local: SocketAddr = listener.local_addr()?;

    let make_svc = make_service_fn(move |_conn| {
        let server = server.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let server = server.clone();
                async move { handle(req, server).await }
            }))
        }
    });

    info!("Web server started @ {local}");
    hyper::Server::from_tcp(listener)?.serve(make_svc).await?;
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
struct RpcParams {
    term: u64,
    server: String,
}

fn parse_params(query: Option<&str>) -> Result<RpcParams, String> {
    let mut term = None;
    let mut server = None;

    for (key, value) in form_urlencoded::parse(query.unwrap_or("").as_bytes()) {
        match key.as_ref() {
            "term" => {
                let parsed = value
                    .parse::<u64>()
                    .map_err(|_| format!("invalid term: {value}"))?;
                term = Some(parsed);
            }
            "server" => server = Some(value.into_owned()),
            _ => {}
        }
    }

    let term = term.ok_or_else(|| "missing term".to_string())?;
    let server = server
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "missing server".to_string())?;
    Ok(RpcParams { term, server })
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Body> {
    let payload = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    let mut resp = Response::new(Body::from(payload));
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    resp
}

fn json_error(status: StatusCode, msg: &str) -> Response<Body> {
    json_response(status, &serde_json::json!({ "error": msg }))
}

async fn handle(req: Request<Body>, server: ElectionServer) -> Result<Response<Body>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    let response = match (method, path.as_str()) {
        (Method::GET, "/heartbeat") => match parse_params(query.as_deref()) {
            Ok(params) => {
                let reply = server.heartbeat(params.term, &params.server).await;
                json_response(StatusCode::OK, &reply)
            }
            Err(msg) => json_error(StatusCode::BAD_REQUEST, &msg),
        },
        (Method::GET, "/requestVote") => match parse_params(query.as_deref()) {
            Ok(params) => {
                let reply = server.request_vote(params.term, &params.server).await;
                let status = if reply.granted {
                    StatusCode::OK
                } else {
                    StatusCode::CONFLICT
                };
                json_response(status, &reply)
            }
            Err(msg) => json_error(StatusCode::BAD_REQUEST, &msg),
        },
        (Method::GET, "/health") => json_response(StatusCode::OK, &build_health(&server).await),
        (Method::GET, "/metrics") => {
            let mut resp = Response::new(Body::from(build_metrics(&server).await));
            resp.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            resp
        }
        _ => json_error(StatusCode::NOT_FOUND, "not found"),
    };

    Ok(response)
}

async fn build_health(server: &ElectionServer) -> serde_json::Value {
    let address = {
        let state = server.state();
        let guard = state.lock().await;
        guard.self_address().to_string()
    };
    let (role, term, leader) = server.status().await;
    serde_json::json!({
        "status": "ok",
        "address": address,
        "role": role.to_string(),
        "term": term,
        "leader": leader,
    })
}

async fn build_metrics(server: &ElectionServer) -> String {
    let (role, term, _) = server.status().await;
    let role_value = match role {
        NodeRole::Follower => 0,
        NodeRole::Candidate => 1,
        NodeRole::Leader => 2,
    };
    let m = metrics::snapshot();

    format!(
        concat!(
            "# TYPE quorum_raft_term gauge\n",
            "quorum_raft_term {}\n",
            "# TYPE quorum_raft_role gauge\n",
            "quorum_raft_role {}\n",
            "# TYPE quorum_elections_total counter\n",
            "quorum_elections_total{{outcome=\"started\"}} {}\n",
            "quorum_elections_total{{outcome=\"won\"}} {}\n",
            "# TYPE quorum_votes_total counter\n",
            "quorum_votes_total{{decision=\"granted\"}} {}\n",
            "quorum_votes_total{{decision=\"rejected\"}} {}\n",
            "# TYPE quorum_heartbeats_total counter\n",
            "quorum_heartbeats_total{{result=\"delivered\"}} {}\n",
            "quorum_heartbeats_total{{result=\"failed\"}} {}\n",
            "# TYPE quorum_peer_unreachable_total counter\n",
            "quorum_peer_unreachable_total {}\n",
        ),
        term,
        role_value,
        m.elections_started,
        m.elections_won,
        m.votes_granted,
        m.votes_rejected,
        m.heartbeats_sent,
        m.heartbeats_failed,
        m.peer_unreachable,
    )
}
