//! Broker HTTP surface: one axum route per run-control and observer RPC.

use crate::broker_state::{BrokerError, BrokerState};
use crate::wire::{
    AliveCellsCountResponse, CalculateAliveCellsResponse, Empty, EvolveWorldRequest, EvolveWorldResponse,
    FlippedEvent, GetCellFlippedResponse, GetGlobalResponse, GetTurnDoneResponse,
};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;

impl IntoResponse for BrokerError {
    fn into_response(self) -> Response {
        let status = match &self {
            BrokerError::NoWorkers => StatusCode::SERVICE_UNAVAILABLE,
            BrokerError::WorkerTransport { .. } => StatusCode::BAD_GATEWAY,
            BrokerError::WorkerStatus { .. } => StatusCode::BAD_GATEWAY,
            BrokerError::WorkerJoin(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router(state: Arc<BrokerState>) -> Router {
    Router::new()
        .route("/evolve", post(evolve_world))
        .route("/pause", post(pause))
        .route("/unpause", post(unpause))
        .route("/quit", post(quit_server))
        .route("/kill", post(kill_server))
        .route("/alive-count", get(alive_cells_count))
        .route("/alive-cells", get(calculate_alive_cells))
        .route("/global", get(get_global))
        .route("/turn-done", get(get_turn_done))
        .route("/flipped", get(get_cell_flipped))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn evolve_world(
    State(state): State<Arc<BrokerState>>,
    Json(req): Json<EvolveWorldRequest>,
) -> Result<Json<EvolveWorldResponse>, BrokerError> {
    let (world, turns_completed) = state.evolve_world(req.world, req.params).await?;
    Ok(Json(EvolveWorldResponse { world, turns_completed }))
}

async fn pause(State(state): State<Arc<BrokerState>>) -> Json<Empty> {
    state.pause();
    Json(Empty::default())
}

async fn unpause(State(state): State<Arc<BrokerState>>) -> Json<Empty> {
    state.unpause();
    Json(Empty::default())
}

async fn quit_server(State(state): State<Arc<BrokerState>>) -> Json<Empty> {
    state.quit_server().await;
    Json(Empty::default())
}

/// Responds first, then gives the kill sequence a moment to flush the
/// response before exiting — mirrors the worker's `/kill` handler, and
/// avoids racing `axum::serve`'s write against `process::exit`.
async fn kill_server(State(state): State<Arc<BrokerState>>) -> Json<Empty> {
    state.kill_server().await;
    tokio::spawn(async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        info!("broker exiting after KillServer");
        std::process::exit(1);
    });
    Json(Empty::default())
}

async fn alive_cells_count(State(state): State<Arc<BrokerState>>) -> Json<AliveCellsCountResponse> {
    let (count, turn) = state.alive_cells_count().await;
    Json(AliveCellsCountResponse { count, turn })
}

async fn calculate_alive_cells(State(state): State<Arc<BrokerState>>) -> Json<CalculateAliveCellsResponse> {
    let cells = state.calculate_alive_cells().await;
    Json(CalculateAliveCellsResponse { cells })
}

async fn get_global(State(state): State<Arc<BrokerState>>) -> Json<GetGlobalResponse> {
    let (world, turn) = state.get_global().await;
    Json(GetGlobalResponse { world, turn })
}

async fn get_turn_done(State(state): State<Arc<BrokerState>>) -> Json<GetTurnDoneResponse> {
    let (turn_done, turn) = state.get_turn_done().await;
    Json(GetTurnDoneResponse { turn_done, turn })
}

async fn get_cell_flipped(State(state): State<Arc<BrokerState>>) -> Json<GetCellFlippedResponse> {
    let events = state
        .get_cell_flipped()
        .await
        .into_iter()
        .map(|(turn, cell)| FlippedEvent { turn, cell })
        .collect();
    Json(GetCellFlippedResponse { events })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{Params, World, ALIVE};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_router() -> Router {
        router(BrokerState::new(vec![]))
    }

    #[tokio::test]
    async fn evolve_zero_turns_round_trips_via_http() {
        let app = test_router();
        let mut world = World::new_dead(2, 2);
        world.set(0, 0, ALIVE);
        let req_body = EvolveWorldRequest {
            world: world.clone(),
            params: Params { height: 2, width: 2, turns: 0, threads: 1 },
        };
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/evolve")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&req_body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: EvolveWorldResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.world, world);
        assert_eq!(body.turns_completed, 0);
    }

    #[tokio::test]
    async fn evolve_with_no_workers_returns_service_unavailable() {
        let app = test_router();
        let req_body = EvolveWorldRequest {
            world: World::new_dead(2, 2),
            params: Params { height: 2, width: 2, turns: 1, threads: 1 },
        };
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/evolve")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&req_body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn flipped_query_on_fresh_broker_is_empty() {
        let app = test_router();
        let response = app
            .oneshot(Request::builder().uri("/flipped").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: GetCellFlippedResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(body.events.is_empty());
    }
}
