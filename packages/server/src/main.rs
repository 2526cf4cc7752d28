//! Dashboard and public API server for the portfolio.
//!
//! Reads `portfolio.toml` / `PORTFOLIO__*` settings, opens the local collections,
//! connects to the remote project and serves the routes in [`routes`].

use api::PortfolioConfig;
use tracing_subscriber::EnvFilter;

use state::{AppState, StartupError};

mod error;
mod extract;
mod routes;
mod state;

const DEFAULT_FILTER: &str = "info,api=debug,store=debug";

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .init();

    let config = PortfolioConfig::load()?;
    let bind = config.server.bind.clone();
    let state = AppState::build(config).await?;
    let router = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .map_err(|e| StartupError::Bind(bind.clone(), e))?;
    tracing::info!("Server listening on {}", bind);

    axum::serve(listener, router)
        .await
        .map_err(StartupError::Serve)
}
