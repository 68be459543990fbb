mod api;
mod app_config;
mod cli;
mod db;
mod pipeline;
mod router;
mod state;

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use crate::state::AppState;

async fn serve(config: roster_core::Config) -> anyhow::Result<()> {
    config.log_summary();
    let pool = db::init_pg_pool(&config.postgres).await?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let port = config.server.port;
    let state = Arc::new(AppState { pool, config });
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://localhost:{}", port);
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = cli::Cli::parse();
    let config = app_config::load_config()?;

    if cli::dispatch(&config, &cli).await? {
        return Ok(());
    }

    serve(config).await
}
