use anyhow::Context;

use fintrack_server::app::{AppState, build_router};
use fintrack_server::config::Config;
use fintrack_server::database;
use fintrack_server::telemetry::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // load environment variables
    dotenv::dotenv().ok();
    init_tracing();

    let config = Config::from_env().context("invalid configuration")?;

    let main_db = database::init_main_db(&config.data_path)
        .await
        .context("failed to initialize main DB")?;
    let state = AppState::new(main_db, &config.data_path);
    let app = build_router(state, &config)?;

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;
    tracing::info!(address = %bind_address, data_path = %config.data_path, "server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
