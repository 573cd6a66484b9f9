//! Intake API: queue companies for enrichment and inspect their progress.

use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;
use url::Url;

use crate::common::StoreError;
use crate::domains::company::{Company, ProcessLog, QueueCompanyRequest};
use crate::server::app::AppState;

const MAX_COMPANY_ID_LEN: usize = 255;
const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct QueueCompanyBody {
    pub company_id: Option<String>,
    pub website_url: Option<String>,
    pub source_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// POST /api/queue — validate and enqueue a company.
pub async fn queue_company_handler(
    Extension(state): Extension<AppState>,
    Json(body): Json<QueueCompanyBody>,
) -> (StatusCode, Json<Value>) {
    let request = match validate_queue_body(body) {
        Ok(request) => request,
        Err(details) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": "Validation error",
                    "details": details.join(", "),
                })),
            );
        }
    };

    match Company::create(&request, &state.db_pool).await {
        Ok(company) => (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "message": "Company queued successfully",
                "data": {
                    "id": company.id,
                    "company_id": company.company_id,
                    "status": company.status,
                    "created_at": company.created_at,
                },
            })),
        ),
        Err(StoreError::Conflict(company_id)) => (
            StatusCode::CONFLICT,
            Json(json!({
                "success": false,
                "error": "Conflict",
                "message": format!("Company with ID {} already exists", company_id),
            })),
        ),
        Err(e) => internal_error("Failed to queue company", e),
    }
}

/// GET /api/queue/:company_id — job state plus the full audit trail.
pub async fn company_status_handler(
    Extension(state): Extension<AppState>,
    Path(company_id): Path<String>,
) -> (StatusCode, Json<Value>) {
    let company = match Company::find_by_company_id(&company_id, &state.db_pool).await {
        Ok(Some(company)) => company,
        Ok(None) => return not_found(&company_id),
        Err(e) => return internal_error("Failed to get company status", e),
    };

    match ProcessLog::find_for_company(&company_id, &state.db_pool).await {
        Ok(logs) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "company": company, "logs": logs },
            })),
        ),
        Err(e) => internal_error("Failed to get company logs", e),
    }
}

/// GET /api/queue — paginated listing, newest first.
pub async fn list_companies_handler(
    Extension(state): Extension<AppState>,
    Query(query): Query<ListQuery>,
) -> (StatusCode, Json<Value>) {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);

    match Company::list(limit, offset, &state.db_pool).await {
        Ok(companies) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": companies,
                "limit": limit,
                "offset": offset,
            })),
        ),
        Err(e) => internal_error("Failed to list companies", e),
    }
}

/// GET /api/queue/failed — jobs waiting on an explicit restart.
pub async fn list_failed_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<Value>) {
    match Company::find_failed(&state.db_pool).await {
        Ok(companies) => (
            StatusCode::OK,
            Json(json!({ "success": true, "data": companies })),
        ),
        Err(e) => internal_error("Failed to list failed companies", e),
    }
}

/// POST /api/queue/:company_id/restart — re-queue without clearing resume
/// data, so finished stages are not repeated.
pub async fn restart_company_handler(
    Extension(state): Extension<AppState>,
    Path(company_id): Path<String>,
) -> (StatusCode, Json<Value>) {
    match Company::restart(&company_id, &state.db_pool).await {
        Ok(company) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Company requeued for processing",
                "data": {
                    "company_id": company.company_id,
                    "status": company.status,
                    "current_step": company.current_step,
                },
            })),
        ),
        Err(StoreError::NotFound(_)) => not_found(&company_id),
        Err(e) => internal_error("Failed to restart company", e),
    }
}

fn validate_queue_body(body: QueueCompanyBody) -> Result<QueueCompanyRequest, Vec<String>> {
    let mut errors = Vec::new();

    let company_id = body.company_id.as_deref().map(str::trim).unwrap_or("");
    if company_id.is_empty() {
        errors.push("company_id is required".to_string());
    } else if company_id.len() > MAX_COMPANY_ID_LEN {
        errors.push(format!(
            "company_id must be less than {} characters",
            MAX_COMPANY_ID_LEN
        ));
    }

    let website_url = body.website_url.as_deref().map(str::trim).unwrap_or("");
    if website_url.is_empty() {
        errors.push("website_url is required".to_string());
    } else if !is_http_url(website_url) {
        errors.push("website_url must be a valid URL".to_string());
    }

    // source_url is optional and falls back to website_url.
    let source_url = body.source_url.as_deref().map(str::trim).unwrap_or("");
    if !source_url.is_empty() && !is_http_url(source_url) {
        errors.push("source_url must be a valid URL".to_string());
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(QueueCompanyRequest {
        company_id: company_id.to_string(),
        website_url: website_url.to_string(),
        source_url: if source_url.is_empty() {
            website_url.to_string()
        } else {
            source_url.to_string()
        },
    })
}

fn is_http_url(value: &str) -> bool {
    matches!(Url::parse(value), Ok(url) if url.scheme() == "http" || url.scheme() == "https")
}

fn not_found(company_id: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "error": "Not found",
            "message": format!("Company with ID {} not found", company_id),
        })),
    )
}

fn internal_error(message: &str, error: StoreError) -> (StatusCode, Json<Value>) {
    error!(error = %error, "{}", message);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "error": "Internal server error",
            "message": message,
        })),
    )
}
