use anyhow::Result;
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

use finledger::backend;
use finledger::config::AppConfig;
use finledger::database::db::{connection, migrate};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    dotenv().ok();

    let config = AppConfig::from_env();

    let pool = connection::get_db_pool(&config.database_url).await?;
    migrate::run_migrations(&pool).await?;

    backend::run_server(pool, config).await
}
