use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::MockState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    /// Jobs created since the mock started.
    jobs: usize,
}

/// GET /health -- liveness plus the number of mock jobs.
async fn health_check(State(state): State<MockState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        jobs: state.job_count().await,
    })
}

pub fn router(state: MockState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(state)
}
