//! Job store tests: atomic create-with-log, conflict handling, restart
//! semantics, and poll/listing queries.

mod common;

use std::time::Duration;

use common::{queue_request, test_pool};
use serde_json::json;
use server_core::common::{ProcessedData, StoreError};
use server_core::domains::company::{
    Company, CompanyStatus, LogStatus, LogStep, PipelineStep, ProcessLog,
};

#[tokio::test]
async fn create_writes_company_and_received_log_together() {
    let pool = test_pool().await;

    let company = Company::create(&queue_request("acme-1"), &pool)
        .await
        .unwrap();

    assert_eq!(company.company_id, "acme-1");
    assert_eq!(company.status, CompanyStatus::Pending);
    assert_eq!(company.current_step, PipelineStep::Pending);
    assert!(company.raw_data.is_none());
    assert!(company.processed_data.is_none());

    let logs = ProcessLog::find_for_company("acme-1", &pool).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].step, LogStep::Received);
    assert_eq!(logs[0].status, LogStatus::Completed);
    assert_eq!(
        logs[0].message.as_deref(),
        Some("Company queued successfully")
    );
}

#[tokio::test]
async fn duplicate_company_id_is_a_conflict() {
    let pool = test_pool().await;
    Company::create(&queue_request("acme-1"), &pool)
        .await
        .unwrap();

    let err = Company::create(&queue_request("acme-1"), &pool)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(ref id) if id == "acme-1"));

    // The rejected attempt must leave no trace: one company, one log entry.
    let logs = ProcessLog::find_for_company("acme-1", &pool).await.unwrap();
    assert_eq!(logs.len(), 1);

    let company = Company::find_by_company_id("acme-1", &pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(company.status, CompanyStatus::Pending);
}

#[tokio::test]
async fn restart_preserves_resume_data() {
    let pool = test_pool().await;
    Company::create(&queue_request("acme-1"), &pool)
        .await
        .unwrap();
    Company::store_raw_data("acme-1", "Acme does widgets.", &pool)
        .await
        .unwrap();
    let processed = ProcessedData::new(json!({"company_data": {"name": "Acme"}, "people": []}));
    Company::store_processed_data("acme-1", &processed, &pool)
        .await
        .unwrap();
    Company::mark_failed("acme-1", &pool).await.unwrap();

    let company = Company::restart("acme-1", &pool).await.unwrap();

    assert_eq!(company.status, CompanyStatus::Pending);
    assert_eq!(company.current_step, PipelineStep::CrmSending);
    assert_eq!(company.raw_data.as_deref(), Some("Acme does widgets."));
    assert!(company.processed().is_some());
}

#[tokio::test]
async fn restart_of_unknown_company_is_not_found() {
    let pool = test_pool().await;
    let err = Company::restart("ghost", &pool).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(ref id) if id == "ghost"));
}

#[tokio::test]
async fn unfinished_query_excludes_terminal_jobs_and_orders_fifo() {
    let pool = test_pool().await;

    Company::create(&queue_request("done"), &pool).await.unwrap();
    Company::mark_completed("done", &pool).await.unwrap();
    Company::create(&queue_request("broken"), &pool).await.unwrap();
    Company::mark_failed("broken", &pool).await.unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;
    Company::create(&queue_request("first"), &pool).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    Company::create(&queue_request("second"), &pool).await.unwrap();

    let unfinished = Company::find_unfinished(&pool).await.unwrap();
    let ids: Vec<_> = unfinished.iter().map(|c| c.company_id.as_str()).collect();
    assert_eq!(ids, vec!["first", "second"]);
}

#[tokio::test]
async fn mark_processing_only_flips_pending_jobs() {
    let pool = test_pool().await;
    Company::create(&queue_request("acme-1"), &pool)
        .await
        .unwrap();

    Company::mark_processing("acme-1", &pool).await.unwrap();
    let company = Company::find_by_company_id("acme-1", &pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(company.status, CompanyStatus::Processing);

    Company::mark_failed("acme-1", &pool).await.unwrap();
    Company::mark_processing("acme-1", &pool).await.unwrap();
    let company = Company::find_by_company_id("acme-1", &pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(company.status, CompanyStatus::Failed);
}

#[tokio::test]
async fn listing_pages_newest_first() {
    let pool = test_pool().await;
    for id in ["a", "b", "c"] {
        Company::create(&queue_request(id), &pool).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let page = Company::list(2, 0, &pool).await.unwrap();
    let ids: Vec<_> = page.iter().map(|c| c.company_id.as_str()).collect();
    assert_eq!(ids, vec!["c", "b"]);

    let page = Company::list(2, 2, &pool).await.unwrap();
    let ids: Vec<_> = page.iter().map(|c| c.company_id.as_str()).collect();
    assert_eq!(ids, vec!["a"]);
}

#[tokio::test]
async fn failed_listing_returns_only_failed_jobs() {
    let pool = test_pool().await;
    Company::create(&queue_request("ok"), &pool).await.unwrap();
    Company::create(&queue_request("bad"), &pool).await.unwrap();
    Company::mark_failed("bad", &pool).await.unwrap();

    let failed = Company::find_failed(&pool).await.unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].company_id, "bad");
}

#[tokio::test]
async fn crm_progress_round_trips_through_storage() {
    let pool = test_pool().await;
    Company::create(&queue_request("acme-1"), &pool)
        .await
        .unwrap();

    let mut processed = ProcessedData::new(json!({"company_data": {}, "people": []}));
    processed.crm_progress.contact_created = true;
    Company::store_processed_data("acme-1", &processed, &pool)
        .await
        .unwrap();

    let company = Company::find_by_company_id("acme-1", &pool)
        .await
        .unwrap()
        .unwrap();
    let stored = company.processed().unwrap();
    assert!(stored.crm_progress.contact_created);
    assert!(!stored.crm_progress.company_updated);
    assert_eq!(company.current_step, PipelineStep::CrmSending);
}

#[tokio::test]
async fn audit_log_is_ordered_and_append_only() {
    let pool = test_pool().await;
    Company::create(&queue_request("acme-1"), &pool)
        .await
        .unwrap();

    ProcessLog::append(
        "acme-1",
        LogStep::Crawling,
        LogStatus::Started,
        "Starting website crawl",
        None,
        &pool,
    )
    .await
    .unwrap();
    ProcessLog::append(
        "acme-1",
        LogStep::Crawling,
        LogStatus::Completed,
        "Website crawl completed",
        Some("18 characters extracted from 1 pages"),
        &pool,
    )
    .await
    .unwrap();

    let logs = ProcessLog::find_for_company("acme-1", &pool).await.unwrap();
    let timeline: Vec<_> = logs.iter().map(|l| (l.step, l.status)).collect();
    assert_eq!(
        timeline,
        vec![
            (LogStep::Received, LogStatus::Completed),
            (LogStep::Crawling, LogStatus::Started),
            (LogStep::Crawling, LogStatus::Completed),
        ]
    );
}
