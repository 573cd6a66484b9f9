use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::common::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum LogStep {
    Received,
    Crawling,
    AiProcessing,
    CrmSending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum LogStatus {
    Started,
    Completed,
    Failed,
}

/// Append-only audit entry. The core never updates or deletes these.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProcessLog {
    pub id: i64,
    pub company_id: String,
    pub step: LogStep,
    pub status: LogStatus,
    pub message: Option<String>,
    pub data: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ProcessLog {
    pub async fn append(
        company_id: &str,
        step: LogStep,
        status: LogStatus,
        message: &str,
        data: Option<&str>,
        pool: &SqlitePool,
    ) -> Result<Self, StoreError> {
        let log = sqlx::query_as::<_, ProcessLog>(
            r#"
            INSERT INTO process_logs (company_id, step, status, message, data, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(step)
        .bind(status)
        .bind(message)
        .bind(data)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;
        Ok(log)
    }

    /// Full audit trail for a company in the order it happened. `id` breaks
    /// ties between entries written within the same timestamp.
    pub async fn find_for_company(
        company_id: &str,
        pool: &SqlitePool,
    ) -> Result<Vec<Self>, StoreError> {
        let logs = sqlx::query_as::<_, ProcessLog>(
            r#"
            SELECT * FROM process_logs
            WHERE company_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(pool)
        .await?;
        Ok(logs)
    }
}
