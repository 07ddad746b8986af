//! Worker HTTP surface: `EvaluateStripe`, `Kill`, and a `/health` route used
//! only by broker-side discovery (necessary ambient plumbing — see
//! `DESIGN.md`).

use crate::life::evaluate_stripe;
use crate::wire::{EvaluateStripeRequest, EvaluateStripeResponse, KillAck};
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::time::{Duration, Instant};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

#[derive(Clone, Default)]
pub struct WorkerState;

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/evaluate-stripe", post(evaluate_stripe_handler))
        .route("/kill", post(kill_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(WorkerState)
}

async fn health() -> &'static str {
    "ok"
}

async fn evaluate_stripe_handler(
    State(_state): State<WorkerState>,
    Json(req): Json<EvaluateStripeRequest>,
) -> Json<EvaluateStripeResponse> {
    debug!(start = req.start_row, end = req.end_row, "evaluating stripe");
    let started = Instant::now();
    let stripe = evaluate_stripe(&req.world, req.start_row, req.end_row);
    tracing::trace!(elapsed_us = started.elapsed().as_micros(), "stripe evaluated");
    Json(EvaluateStripeResponse { stripe })
}

/// Acknowledges first, then exits from a spawned task so the HTTP response
/// actually reaches the broker before the process dies.
async fn kill_handler(State(_state): State<WorkerState>) -> Json<KillAck> {
    info!("worker received Kill; exiting after response flush");
    tokio::spawn(async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        std::process::exit(1);
    });
    Json(KillAck { ok: true })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::World;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_route_answers_ok() {
        let app = router();
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn evaluate_stripe_matches_pure_function() {
        let app = router();
        let world = World::new_dead(4, 4);
        let req = EvaluateStripeRequest { world: world.clone(), start_row: 1, end_row: 3 };
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/evaluate-stripe")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&req).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: EvaluateStripeResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.stripe, evaluate_stripe(&world, 1, 3));
    }
}
