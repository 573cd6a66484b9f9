use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::common::{ProcessedData, StoreError};

use super::process_log::LogStep;

/// Coarse job lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum CompanyStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Fine-grained resume pointer through the pipeline. Only ever advances
/// forward; a failure leaves it at the stage that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum PipelineStep {
    Pending,
    Crawling,
    AiProcessing,
    CrmSending,
    Completed,
}

/// Intake payload for queueing a company.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueCompanyRequest {
    pub company_id: String,
    pub website_url: String,
    pub source_url: String,
}

/// Enrichment job, one row per company.
///
/// `raw_data` / `processed_data` presence is what decides whether the crawl
/// and AI stages still need to run; `current_step` tracks the same progress
/// for display and logging and is kept in sync on every transition.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    pub id: i64,
    pub company_id: String,
    pub website_url: String,
    pub source_url: String,
    pub status: CompanyStatus,
    pub current_step: PipelineStep,
    pub raw_data: Option<String>,
    pub processed_data: Option<Json<ProcessedData>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Company {
    /// Queue a new company. The company row and its `received` audit entry
    /// are written in one transaction, so a crash can never leave one
    /// without the other. A duplicate `company_id` yields `Conflict`.
    pub async fn create(
        req: &QueueCompanyRequest,
        pool: &SqlitePool,
    ) -> Result<Self, StoreError> {
        let now = Utc::now();
        let mut tx = pool.begin().await?;

        let inserted = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (company_id, website_url, source_url, status, current_step, created_at, updated_at)
            VALUES ($1, $2, $3, 'pending', 'pending', $4, $4)
            RETURNING *
            "#,
        )
        .bind(&req.company_id)
        .bind(&req.website_url)
        .bind(&req.source_url)
        .bind(now)
        .fetch_one(&mut *tx)
        .await;

        let company = match inserted {
            Ok(company) => company,
            Err(e) if is_unique_violation(&e) => {
                return Err(StoreError::Conflict(req.company_id.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        sqlx::query(
            r#"
            INSERT INTO process_logs (company_id, step, status, message, created_at)
            VALUES ($1, 'received', 'completed', 'Company queued successfully', $2)
            "#,
        )
        .bind(&req.company_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(company)
    }

    pub async fn find_by_company_id(
        company_id: &str,
        pool: &SqlitePool,
    ) -> Result<Option<Self>, StoreError> {
        let company =
            sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE company_id = $1")
                .bind(company_id)
                .fetch_optional(pool)
                .await?;
        Ok(company)
    }

    /// Jobs the background processor should pick up, oldest first. Failed
    /// jobs are excluded; they only re-enter via an explicit restart.
    pub async fn find_unfinished(pool: &SqlitePool) -> Result<Vec<Self>, StoreError> {
        let companies = sqlx::query_as::<_, Company>(
            r#"
            SELECT * FROM companies
            WHERE status IN ('pending', 'processing') AND current_step != 'completed'
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(pool)
        .await?;
        Ok(companies)
    }

    pub async fn find_failed(pool: &SqlitePool) -> Result<Vec<Self>, StoreError> {
        let companies = sqlx::query_as::<_, Company>(
            "SELECT * FROM companies WHERE status = 'failed' ORDER BY updated_at DESC, id DESC",
        )
        .fetch_all(pool)
        .await?;
        Ok(companies)
    }

    pub async fn list(
        limit: i64,
        offset: i64,
        pool: &SqlitePool,
    ) -> Result<Vec<Self>, StoreError> {
        let companies = sqlx::query_as::<_, Company>(
            "SELECT * FROM companies ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(companies)
    }

    /// Flip a pending job to processing. A no-op for any other status.
    pub async fn mark_processing(company_id: &str, pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE companies
            SET status = 'processing', updated_at = $2
            WHERE company_id = $1 AND status = 'pending'
            "#,
        )
        .bind(company_id)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record the display/progress pointer for the stage about to run.
    pub async fn set_current_step(
        company_id: &str,
        step: PipelineStep,
        pool: &SqlitePool,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE companies SET current_step = $2, updated_at = $3 WHERE company_id = $1")
            .bind(company_id)
            .bind(step)
            .bind(Utc::now())
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Store crawl output and advance past the crawl stage.
    pub async fn store_raw_data(
        company_id: &str,
        raw_data: &str,
        pool: &SqlitePool,
    ) -> Result<Self, StoreError> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies
            SET raw_data = $2, current_step = 'ai_processing', updated_at = $3
            WHERE company_id = $1
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(raw_data)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(company_id.to_string()))?;
        Ok(company)
    }

    /// Store the AI extraction output and advance to the CRM stage.
    pub async fn store_processed_data(
        company_id: &str,
        data: &ProcessedData,
        pool: &SqlitePool,
    ) -> Result<Self, StoreError> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies
            SET processed_data = $2, current_step = 'crm_sending', updated_at = $3
            WHERE company_id = $1
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(Json(data))
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(company_id.to_string()))?;
        Ok(company)
    }

    /// Persist CRM sub-step progress mid-sync, without touching the step
    /// pointer. Called after every completed sub-step so a crash resumes at
    /// the first unfinished one.
    pub async fn save_crm_progress(
        company_id: &str,
        data: &ProcessedData,
        pool: &SqlitePool,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE companies SET processed_data = $2, updated_at = $3 WHERE company_id = $1")
            .bind(company_id)
            .bind(Json(data))
            .bind(Utc::now())
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn mark_completed(company_id: &str, pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE companies
            SET status = 'completed', current_step = 'completed', updated_at = $2
            WHERE company_id = $1
            "#,
        )
        .bind(company_id)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark the job failed. `current_step` is deliberately left alone so a
    /// later restart resumes at the stage that failed.
    pub async fn mark_failed(company_id: &str, pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::query("UPDATE companies SET status = 'failed', updated_at = $2 WHERE company_id = $1")
            .bind(company_id)
            .bind(Utc::now())
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Re-queue a job for another pipeline pass. Resume data (`raw_data`,
    /// `processed_data`, `current_step`) is preserved so already-finished
    /// stages are not repeated.
    pub async fn restart(company_id: &str, pool: &SqlitePool) -> Result<Self, StoreError> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies
            SET status = 'pending', updated_at = $2
            WHERE company_id = $1
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(company_id.to_string()))?;
        Ok(company)
    }

    /// The audit-log step a failure in the job's next stage belongs to.
    pub fn next_log_step(&self) -> LogStep {
        if self.raw_data.is_none() {
            LogStep::Crawling
        } else if self.processed_data.is_none() {
            LogStep::AiProcessing
        } else {
            LogStep::CrmSending
        }
    }

    pub fn processed(&self) -> Option<&ProcessedData> {
        self.processed_data.as_ref().map(|json| &json.0)
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}
