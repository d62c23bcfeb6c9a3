use std::env;

use tracing::warn;

/// Process configuration, read once at startup. `.env` is loaded by main
/// before this runs; every value has a development default.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_expire_hours: i64,
    pub cors_origin: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./finledger.db".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5000);

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, falling back to the development secret");
            "dev_secret_change_me".to_string()
        });

        let jwt_expire_hours = env::var("JWT_EXPIRE_HOURS")
            .ok()
            .and_then(|h| h.parse().ok())
            .unwrap_or(24);

        let cors_origin =
            env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".to_string());

        Self {
            database_url,
            port,
            jwt_secret,
            jwt_expire_hours,
            cors_origin,
        }
    }
}
