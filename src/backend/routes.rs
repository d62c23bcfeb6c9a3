use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::backend::{handlers, AppState};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route(
            "/api/transactions",
            get(handlers::transactions::list).post(handlers::transactions::create),
        )
        .route(
            "/api/transactions/{id}",
            put(handlers::transactions::update).delete(handlers::transactions::remove),
        )
        .route(
            "/api/budgets",
            get(handlers::budgets::list).post(handlers::budgets::upsert),
        )
        .route("/api/budgets/{id}", delete(handlers::budgets::remove))
        .route(
            "/api/recurring",
            get(handlers::recurring::list).post(handlers::recurring::create),
        )
        .route("/api/recurring/{id}", delete(handlers::recurring::remove))
        .route("/api/recurring/generate", post(handlers::recurring::generate))
        .route("/api/dashboard", get(handlers::dashboard::summary))
        .route(
            "/api/export/transactions",
            get(handlers::export::transactions),
        )
}
