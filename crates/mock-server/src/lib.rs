//! Mock generation service.
//!
//! Mirrors the HTTP contract of the real generation backend but walks
//! every job through a fixed status flow, one step per status request, so
//! the tracker can be exercised without cloud credentials.

pub mod config;
pub mod error;
pub mod flow;
pub mod routes;
pub mod state;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::MockState;

/// Browser origins of the local frontend dev servers.
pub const DEV_ORIGINS: [&str; 3] = [
    "http://localhost",
    "http://localhost:5173",
    "http://127.0.0.1:5173",
];

/// Build the full mock router with CORS and tracing.
pub fn build_app(state: MockState) -> Router {
    Router::new()
        .merge(routes::health::router(state.clone()))
        .merge(routes::jobs::router(state))
        .layer(build_cors_layer())
        .layer(TraceLayer::new_for_http())
}

/// CORS for the dev origins. Credentials are allowed, so methods and
/// headers are listed rather than wildcarded.
pub fn build_cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = DEV_ORIGINS
        .into_iter()
        .map(HeaderValue::from_static)
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
}

/// Serve the mock on an already-bound listener until the task is dropped.
pub async fn serve(listener: tokio::net::TcpListener, state: MockState) -> std::io::Result<()> {
    axum::serve(listener, build_app(state)).await
}
