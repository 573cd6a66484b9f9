//! Application setup and router configuration.

use axum::extract::Extension;
use axum::routing::{get, post};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

use crate::server::middleware::auth_middleware;
use crate::server::routes::{
    company_status_handler, health_handler, list_companies_handler, list_failed_handler,
    queue_company_handler, restart_company_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    /// Intake API token; `None` means open access.
    pub auth_token: Option<String>,
}

pub fn build_app(db_pool: SqlitePool, auth_token: Option<String>) -> Router {
    let state = AppState {
        db_pool,
        auth_token,
    };

    // Health stays reachable without a token; everything else under /api
    // goes through the auth middleware.
    let public = Router::new().route("/api/health", get(health_handler));

    let protected = Router::new()
        .route(
            "/api/queue",
            post(queue_company_handler).get(list_companies_handler),
        )
        .route("/api/queue/failed", get(list_failed_handler))
        .route("/api/queue/:company_id", get(company_status_handler))
        .route("/api/queue/:company_id/restart", post(restart_company_handler))
        .layer(axum::middleware::from_fn(auth_middleware));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}
