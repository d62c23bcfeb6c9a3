//! Shared test helpers: in-memory database setup and seed rows.

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

use crate::config::AppConfig;
use crate::database::db::{migrate, queries};

/// Fixed configuration for handler tests; nothing reads the environment.
pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        port: 0,
        jwt_secret: "test-secret".to_string(),
        jwt_expire_hours: 1,
        cors_origin: "http://localhost:5173".to_string(),
    }
}

/// Creates a migrated in-memory SQLite database. Capped at one connection:
/// an in-memory database lives and dies with its connection, so a larger
/// pool would hand out empty databases.
pub async fn setup_test_db() -> Result<Pool<Sqlite>> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    migrate::run_migrations(&pool).await?;
    Ok(pool)
}

/// Inserts a user and returns its id. The password column holds a dummy
/// hash; tests that exercise login hash their own.
pub async fn create_test_user(pool: &Pool<Sqlite>, email: &str) -> Result<i64> {
    let user = queries::create_user(pool, "Test User", email, "not-a-real-hash").await?;
    Ok(user.id)
}
