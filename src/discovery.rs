//! Worker discovery file: one or more whitespace-separated `host:port`
//! tokens per line. Read once by the broker at startup; the surviving set
//! is immutable for the process lifetime.

use std::time::Duration;
use tracing::{info, warn};

/// Splits `path`'s contents on whitespace. A missing or unreadable file
/// yields an empty list rather than an error — the broker then runs with
/// an empty worker set, and `EvolveWorld` is the place that turns "zero
/// workers" into a hard error.
pub fn read_worker_lines(path: &str) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => text.split_whitespace().map(str::to_owned).collect(),
        Err(e) => {
            warn!(path, error = %e, "worker discovery file unreadable; starting with no workers");
            Vec::new()
        }
    }
}

/// Probes each candidate worker with `GET /health` and keeps only the ones
/// that answer within `timeout`. Order is preserved — worker id assignment
/// (and therefore stripe ordering) depends on it.
pub async fn probe_workers(candidates: &[String], timeout: Duration) -> Vec<String> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("failed to build discovery probe client");

    let mut alive = Vec::with_capacity(candidates.len());
    for addr in candidates {
        let url = format!("http://{addr}/health");
        match client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!(addr, "worker discovered");
                alive.push(addr.clone());
            }
            Ok(resp) => warn!(addr, status = %resp.status(), "worker health check failed"),
            Err(e) => warn!(addr, error = %e, "worker unreachable at startup; dropping"),
        }
    }
    alive
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_multiple_tokens_per_line_and_blank_lines() {
        let dir = std::env::temp_dir().join(format!("gol-workers-test-{}", std::process::id()));
        std::fs::write(&dir, "127.0.0.1:8040 127.0.0.1:8041\n\n127.0.0.1:8042\n").unwrap();
        let lines = read_worker_lines(dir.to_str().unwrap());
        std::fs::remove_file(&dir).ok();
        assert_eq!(
            lines,
            vec!["127.0.0.1:8040", "127.0.0.1:8041", "127.0.0.1:8042"]
        );
    }

    #[test]
    fn missing_file_yields_empty_list() {
        let lines = read_worker_lines("/nonexistent/path/workers.txt");
        assert!(lines.is_empty());
    }
}
