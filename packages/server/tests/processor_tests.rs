//! Background processor tests: the stage state machine, failure handling,
//! and partial-resume semantics.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{ai_reply, queue_request, test_pool, test_processor};
use server_core::domains::company::{
    Company, CompanyStatus, LogStatus, LogStep, PipelineStep, ProcessLog,
};
use server_core::kernel::test_dependencies::{MockAI, MockCrm, MockWebScraper};

#[tokio::test]
async fn end_to_end_pipeline_completes_with_seven_log_entries() {
    let pool = test_pool().await;
    let scraper = Arc::new(MockWebScraper::new().with_content("Acme does widgets."));
    let ai = Arc::new(MockAI::new().with_reply(&ai_reply()));
    let crm = Arc::new(MockCrm::new());
    let processor = test_processor(&pool, scraper.clone(), ai.clone(), crm.clone());

    Company::create(&queue_request("acme-1"), &pool)
        .await
        .unwrap();
    processor.process_pending().await;

    let company = Company::find_by_company_id("acme-1", &pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(company.status, CompanyStatus::Completed);
    assert_eq!(company.current_step, PipelineStep::Completed);
    assert_eq!(company.raw_data.as_deref(), Some("Acme does widgets."));

    let processed = company.processed().unwrap();
    assert!(processed.crm_progress.all_done());
    assert_eq!(processed.crm_trace.len(), 4);

    let logs = ProcessLog::find_for_company("acme-1", &pool).await.unwrap();
    let timeline: Vec<_> = logs.iter().map(|l| (l.step, l.status)).collect();
    assert_eq!(
        timeline,
        vec![
            (LogStep::Received, LogStatus::Completed),
            (LogStep::Crawling, LogStatus::Started),
            (LogStep::Crawling, LogStatus::Completed),
            (LogStep::AiProcessing, LogStatus::Started),
            (LogStep::AiProcessing, LogStatus::Completed),
            (LogStep::CrmSending, LogStatus::Started),
            (LogStep::CrmSending, LogStatus::Completed),
        ]
    );

    // No people extracted, so the contact batch is empty; company update and
    // note creation still run.
    assert_eq!(
        crm.calls(),
        vec!["create_people:0", "update_company", "create_note"]
    );
    assert_eq!(scraper.calls().len(), 1);
    assert_eq!(ai.prompts().len(), 1);
}

#[tokio::test]
async fn crawl_failure_marks_job_failed_and_preserves_state() {
    let pool = test_pool().await;
    let scraper = Arc::new(MockWebScraper::new().with_failure("connection refused"));
    let ai = Arc::new(MockAI::new());
    let crm = Arc::new(MockCrm::new());
    let processor = test_processor(&pool, scraper.clone(), ai.clone(), crm.clone());

    Company::create(&queue_request("acme-1"), &pool)
        .await
        .unwrap();
    processor.process_pending().await;

    let company = Company::find_by_company_id("acme-1", &pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(company.status, CompanyStatus::Failed);
    assert_eq!(company.current_step, PipelineStep::Crawling);
    assert!(company.raw_data.is_none());

    let logs = ProcessLog::find_for_company("acme-1", &pool).await.unwrap();
    let timeline: Vec<_> = logs.iter().map(|l| (l.step, l.status)).collect();
    assert_eq!(
        timeline,
        vec![
            (LogStep::Received, LogStatus::Completed),
            (LogStep::Crawling, LogStatus::Started),
            (LogStep::Crawling, LogStatus::Failed),
        ]
    );
    let failure = logs.last().unwrap();
    assert!(failure
        .message
        .as_deref()
        .unwrap()
        .contains("connection refused"));

    // Later stages never ran.
    assert!(ai.prompts().is_empty());
    assert!(crm.calls().is_empty());
}

#[tokio::test]
async fn failed_jobs_are_not_retried_until_restarted() {
    let pool = test_pool().await;
    let scraper = Arc::new(MockWebScraper::new().with_failure("boom"));
    let ai = Arc::new(MockAI::new());
    let crm = Arc::new(MockCrm::new());
    let processor = test_processor(&pool, scraper.clone(), ai, crm);

    Company::create(&queue_request("acme-1"), &pool)
        .await
        .unwrap();
    processor.process_pending().await;
    assert_eq!(scraper.calls().len(), 1);

    // The failed job is excluded from subsequent passes.
    processor.process_pending().await;
    assert_eq!(scraper.calls().len(), 1);
}

#[tokio::test]
async fn restart_after_crawl_failure_reruns_the_crawl() {
    let pool = test_pool().await;
    let scraper = Arc::new(
        MockWebScraper::new()
            .with_failure("connection refused")
            .with_content("Acme does widgets."),
    );
    let ai = Arc::new(MockAI::new().with_reply(&ai_reply()));
    let crm = Arc::new(MockCrm::new());
    let processor = test_processor(&pool, scraper.clone(), ai, crm);

    Company::create(&queue_request("acme-1"), &pool)
        .await
        .unwrap();
    processor.process_pending().await;

    Company::restart("acme-1", &pool).await.unwrap();
    processor.process_pending().await;

    let company = Company::find_by_company_id("acme-1", &pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(company.status, CompanyStatus::Completed);
    // raw_data was still absent after the failure, so the crawl ran again.
    assert_eq!(scraper.calls().len(), 2);
}

#[tokio::test]
async fn restart_after_ai_failure_skips_the_crawl() {
    let pool = test_pool().await;
    let scraper = Arc::new(MockWebScraper::new().with_content("Acme does widgets."));
    let ai = Arc::new(MockAI::new().with_failure("model overloaded").with_reply(&ai_reply()));
    let crm = Arc::new(MockCrm::new());
    let processor = test_processor(&pool, scraper.clone(), ai.clone(), crm);

    Company::create(&queue_request("acme-1"), &pool)
        .await
        .unwrap();
    processor.process_pending().await;

    let company = Company::find_by_company_id("acme-1", &pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(company.status, CompanyStatus::Failed);
    assert_eq!(company.current_step, PipelineStep::AiProcessing);
    assert!(company.raw_data.is_some());
    assert!(company.processed_data.is_none());

    let logs = ProcessLog::find_for_company("acme-1", &pool).await.unwrap();
    let failure = logs.last().unwrap();
    assert_eq!(failure.step, LogStep::AiProcessing);
    assert_eq!(failure.status, LogStatus::Failed);

    Company::restart("acme-1", &pool).await.unwrap();
    processor.process_pending().await;

    let company = Company::find_by_company_id("acme-1", &pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(company.status, CompanyStatus::Completed);
    // Crawl output was preserved, so only the AI stage ran twice.
    assert_eq!(scraper.calls().len(), 1);
    assert_eq!(ai.prompts().len(), 2);
}

#[tokio::test]
async fn malformed_ai_reply_fails_the_ai_stage() {
    let pool = test_pool().await;
    let scraper = Arc::new(MockWebScraper::new().with_content("Acme does widgets."));
    let ai = Arc::new(MockAI::new().with_reply("I could not find any structured data."));
    let crm = Arc::new(MockCrm::new());
    let processor = test_processor(&pool, scraper, ai, crm.clone());

    Company::create(&queue_request("acme-1"), &pool)
        .await
        .unwrap();
    processor.process_pending().await;

    let company = Company::find_by_company_id("acme-1", &pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(company.status, CompanyStatus::Failed);
    assert_eq!(company.current_step, PipelineStep::AiProcessing);
    assert!(company.processed_data.is_none());
    assert!(crm.calls().is_empty());
}

#[tokio::test]
async fn completed_jobs_are_not_reprocessed() {
    let pool = test_pool().await;
    let scraper = Arc::new(MockWebScraper::new().with_content("Acme does widgets."));
    let ai = Arc::new(MockAI::new().with_reply(&ai_reply()));
    let crm = Arc::new(MockCrm::new());
    let processor = test_processor(&pool, scraper.clone(), ai.clone(), crm.clone());

    Company::create(&queue_request("acme-1"), &pool)
        .await
        .unwrap();
    processor.process_pending().await;
    processor.process_pending().await;

    assert_eq!(scraper.calls().len(), 1);
    assert_eq!(ai.prompts().len(), 1);
    assert_eq!(crm.calls().len(), 3);

    let logs = ProcessLog::find_for_company("acme-1", &pool).await.unwrap();
    assert_eq!(logs.len(), 7);
}

#[tokio::test]
async fn companies_are_processed_oldest_first() {
    let pool = test_pool().await;
    let scraper = Arc::new(
        MockWebScraper::new()
            .with_content("First site.")
            .with_content("Second site."),
    );
    let ai = Arc::new(MockAI::new().with_reply(&ai_reply()).with_reply(&ai_reply()));
    let crm = Arc::new(MockCrm::new());
    let processor = test_processor(&pool, scraper.clone(), ai, crm);

    let mut first = queue_request("first");
    first.website_url = "https://first.example".to_string();
    Company::create(&first, &pool).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let mut second = queue_request("second");
    second.website_url = "https://second.example".to_string();
    Company::create(&second, &pool).await.unwrap();

    processor.process_pending().await;

    let urls: Vec<_> = scraper.calls().into_iter().map(|c| c.url).collect();
    assert_eq!(
        urls,
        vec!["https://first.example", "https://second.example"]
    );
}

#[tokio::test]
async fn polling_loop_picks_up_jobs_and_stops_cleanly() {
    let pool = test_pool().await;
    let scraper = Arc::new(MockWebScraper::new().with_content("Acme does widgets."));
    let ai = Arc::new(MockAI::new().with_reply(&ai_reply()));
    let crm = Arc::new(MockCrm::new());
    let processor = test_processor(&pool, scraper, ai, crm);

    let handle = processor.start();
    Company::create(&queue_request("acme-1"), &pool)
        .await
        .unwrap();

    // Two or three 50ms ticks are plenty.
    tokio::time::sleep(Duration::from_millis(400)).await;

    let company = Company::find_by_company_id("acme-1", &pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(company.status, CompanyStatus::Completed);

    processor.stop();
    handle.await.unwrap();
}
