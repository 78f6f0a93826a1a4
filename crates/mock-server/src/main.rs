//! `reelgen-mock` -- stand-in generation service for local development.

use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelgen_mock::config::MockConfig;
use reelgen_mock::state::MockState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelgen_mock=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = MockConfig::from_env().unwrap_or_else(|e| {
        tracing::error!("{e}");
        std::process::exit(1);
    });

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .unwrap_or_else(|_| {
            tracing::error!(host = %config.host, "MOCK_HOST is not a valid address");
            std::process::exit(1);
        });

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to bind {addr}");
            std::process::exit(1);
        });
    tracing::info!("Mock generation service listening on {addr}");

    if let Err(e) = reelgen_mock::serve(listener, MockState::new()).await {
        tracing::error!(error = %e, "Mock server stopped");
    }
}
