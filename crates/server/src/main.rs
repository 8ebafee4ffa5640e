mod api;
mod auth;
mod cli;
mod db;
mod router;
mod runner;
mod state;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use sattrack_store::Store;

use crate::state::AppState;

fn load_config() -> sattrack_core::Config {
    sattrack_core::config::load_dotenv();
    sattrack_core::Config::from_env()
}

async fn serve(config: sattrack_core::Config) -> anyhow::Result<()> {
    config.log_summary();

    let pool = db::init_pg_pool(&config.postgres).await?;
    let store = Store::new(pool);
    let state = Arc::new(AppState::new(config.clone(), store));

    // The long-running server is the only entry point that starts the
    // scheduler; maintenance commands never do.
    runner::start(state.clone());

    let app = router::build(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = load_config();
    let args: Vec<String> = std::env::args().collect();

    if cli::dispatch(&config, &args).await? {
        return Ok(());
    }

    serve(config).await
}
