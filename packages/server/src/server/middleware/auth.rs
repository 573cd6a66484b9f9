//! Token authentication for the intake API.
//!
//! When AUTH_TOKEN is configured, requests must carry it in the
//! `x-auth-token` header, an `Authorization: Bearer` header, or a `?token=`
//! query parameter. An unset token means open access.

use axum::extract::{Extension, Request};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::debug;

use crate::server::app::AppState;

pub async fn auth_middleware(
    Extension(state): Extension<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = &state.auth_token else {
        return next.run(request).await;
    };

    match token_from_request(&request) {
        Some(token) if token == *expected => next.run(request).await,
        _ => {
            debug!(path = %request.uri().path(), "Rejected request without valid auth token");
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "success": false,
                    "error": "Unauthorized. Please provide a valid auth token."
                })),
            )
                .into_response()
        }
    }
}

fn token_from_request(request: &Request) -> Option<String> {
    if let Some(token) = request
        .headers()
        .get("x-auth-token")
        .and_then(|v| v.to_str().ok())
    {
        return Some(token.to_string());
    }

    if let Some(auth) = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
    {
        return Some(auth.strip_prefix("Bearer ").unwrap_or(auth).to_string());
    }

    let query = request.uri().query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
}
