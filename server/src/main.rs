use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use marquee_server::config::Config;
use marquee_server::routes::create_routes;
use marquee_server::store::PgStore;
use marquee_server::AppState;

const DEFAULT_LOG_FILTER: &str = "marquee_server=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = Config::from_env().context("Invalid configuration")?;

    let store = PgStore::connect(&config.database_url, config.db_max_connections)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Successfully connected to database");

    store.migrate().await.context("Failed to run migrations")?;
    tracing::info!("Migrations run successfully");

    let state = AppState::new(Arc::new(store), &config).context("Failed to build services")?;
    let app = create_routes(state, &config);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("Server running at http://{}", config.bind_addr);

    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
