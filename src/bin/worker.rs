//! Worker binary: a stateless stripe evaluator.
//!
//! `EvaluateStripe` and `Kill`, served over HTTP. No retained state across
//! calls beyond liveness — a fresh `axum::Router` is all this needs.

#![forbid(unsafe_code)]

use std::env;
use std::net::SocketAddr;

use distributed_gol::cli::parse_u64_flag;
use distributed_gol::worker_service;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env::var("RUST_LOG").unwrap_or_else(|_| "worker=info,tower_http=info".into()))
        .with_target(false)
        .compact()
        .init();

    let args: Vec<String> = env::args().collect();
    let port = parse_u64_flag(&args, "--port", 8040);
    let addr = SocketAddr::from(([0, 0, 0, 0], port as u16));

    let app = worker_service::router();

    tracing::info!(%addr, "worker listening");
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!(%addr, error = %e, "failed to bind listener");
        e
    })?;
    axum::serve(listener, app).await?;
    Ok(())
}
