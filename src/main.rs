use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;

use quorum::config::Config;
use quorum::network::http::{bind, run_http};
use quorum::network::HttpTransport;
use quorum::raft::Raft;

#[derive(Parser)]
#[command(name = "quorum")]
#[command(about = "Raft-style leader election over HTTP")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start an election node
    Node {
        /// Address to listen on; must appear in the cluster list
        #[arg(short, long)]
        address: Option<String>,

        /// Comma-separated list of all member addresses, self included
        #[arg(short, long)]
        cluster: Option<String>,

        /// JSON config file; flags override its values
        #[arg(long)]
        config: Option<String>,

        /// Leader heartbeat period in milliseconds
        #[arg(long)]
        heartbeat_interval_ms: Option<u64>,

        /// Lower bound of the randomized election timeout in milliseconds
        #[arg(long)]
        election_timeout_min_ms: Option<u64>,

        /// Upper bound of the randomized election timeout in milliseconds
        #[arg(long)]
        election_timeout_max_ms: Option<u64>,

        /// Per-call timeout for outbound RPCs in milliseconds
        #[arg(long)]
        rpc_timeout_ms: Option<u64>,
    },

    /// Admin tooling
    Admin {
        #[command(subcommand)]
        cmd: AdminCmd,
    },
}

#[derive(Subcommand)]
enum AdminCmd {
    /// Show role, term and leader of a node (host:port)
    Status {
        #[arg(long)]
        http: String,
    },
    /// Dump Prometheus metrics of a node (host:port)
    Metrics {
        #[arg(long)]
        http: String,
    },
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

async fn http_get(host_port: &str, path: &str) -> anyhow::Result<String> {
    let uri: hyper::Uri = format!("http://{host_port}{path}")
        .parse()
        .with_context(|| format!("invalid address {host_port}"))?;
    let resp = hyper::Client::new()
        .get(uri)
        .await
        .with_context(|| format!("GET {path} from {host_port}"))?;
    let body = hyper::body::to_bytes(resp.into_body()).await?;
    Ok(String::from_utf8_lossy(&body).into_owned())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Command::Admin { cmd } => match cmd {
            AdminCmd::Status { http } => println!("{}", http_get(&http, "/health").await?),
            AdminCmd::Metrics { http } => println!("{}", http_get(&http, "/metrics").await?),
        },
        Command::Node {
            address,
            cluster,
            config,
            heartbeat_interval_ms,
            election_timeout_min_ms,
            election_timeout_max_ms,
            rpc_timeout_ms,
        } => {
            let mut cfg = match config {
                Some(path) => Config::from_file(&path)
                    .with_context(|| format!("loading config from {path}"))?,
                None => Config::default(),
            };
            if let Some(address) = address {
                cfg.address = address;
            }
            if let Some(cluster) = cluster {
                cfg.cluster = Config::parse_cluster(&cluster);
            }
            if let Some(ms) = heartbeat_interval_ms {
                cfg.raft.heartbeat_interval = ms;
            }
            if let Some(ms) = election_timeout_min_ms {
                cfg.raft.election_timeout_min = ms;
            }
            if let Some(ms) = election_timeout_max_ms {
                cfg.raft.election_timeout_max = ms;
            }
            if let Some(ms) = rpc_timeout_ms {
                cfg.raft.rpc_timeout = ms;
            }

            let peers = cfg.validate()?;
            info!(
                "Starting quorum node {} with {} peers (quorum {})",
                cfg.address,
                peers.peer_count(),
                peers.quorum()
            );
            for peer in peers.peers() {
                info!("Added peer: {peer}");
            }

            let listener = bind(&cfg.address)?;
            let raft = Raft::new(peers, cfg.raft.clone());
            let transport = Arc::new(HttpTransport::new(raft.config().rpc_timeout()));
            let _driver = raft.start(transport);

            run_http(listener, raft.server()).await?;
        }
    }

    Ok(())
}
