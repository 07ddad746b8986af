//! Broker binary: the authoritative coordinator.
//!
//! Reads the worker discovery file once at startup, probes each candidate,
//! and serves the run-control/observer RPC surface over the surviving,
//! immutable worker set.

#![forbid(unsafe_code)]

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use distributed_gol::broker_service;
use distributed_gol::broker_state::BrokerState;
use distributed_gol::cli::{parse_string_flag, parse_u64_flag};
use distributed_gol::discovery::{probe_workers, read_worker_lines};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env::var("RUST_LOG").unwrap_or_else(|_| "broker=info,tower_http=info".into()))
        .with_target(false)
        .compact()
        .init();

    let args: Vec<String> = env::args().collect();
    let port = parse_u64_flag(&args, "--port", 8030);
    let workers_path = parse_string_flag(&args, "--workers", "workers.txt");

    let candidates = read_worker_lines(&workers_path);
    let workers = probe_workers(&candidates, Duration::from_secs(2)).await;
    tracing::info!(discovered = candidates.len(), alive = workers.len(), "worker discovery complete");

    let state = BrokerState::new(workers);
    let app = broker_service::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port as u16));
    tracing::info!(%addr, "broker listening");
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!(%addr, error = %e, "failed to bind listener");
        e
    })?;
    axum::serve(listener, app).await?;
    Ok(())
}
