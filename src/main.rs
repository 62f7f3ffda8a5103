mod app;
mod config;
mod errors;
mod handlers;
mod middleware;
mod models;
mod services;
mod session;
mod views;
#[cfg(test)]
mod test_support;

use anyhow::Context;
use crate::{app::AppState, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize basic tracing subscriber
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Relaying to API at {}", config.api.base_url);

    let state = AppState::new(config).context("Failed to initialise application state")?;
    let app = app::router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind server on {}", addr))?;

    tracing::info!("Server running on {}", addr);
    axum::serve(listener, app.into_make_service())
        .await
        .context("Server error")?;

    Ok(())
}
