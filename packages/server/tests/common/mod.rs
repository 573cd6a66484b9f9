// Common test utilities

use std::sync::Arc;
use std::time::Duration;

use server_core::common::db;
use server_core::domains::company::QueueCompanyRequest;
use server_core::kernel::test_dependencies::{MockAI, MockCrm, MockWebScraper};
use server_core::kernel::{Processor, ProcessorConfig};
use sqlx::SqlitePool;

pub async fn test_pool() -> SqlitePool {
    db::connect_in_memory().await.expect("in-memory database")
}

pub fn queue_request(company_id: &str) -> QueueCompanyRequest {
    QueueCompanyRequest {
        company_id: company_id.to_string(),
        website_url: "https://acme.example".to_string(),
        source_url: "https://acme.example".to_string(),
    }
}

pub fn test_processor(
    pool: &SqlitePool,
    scraper: Arc<MockWebScraper>,
    ai: Arc<MockAI>,
    crm: Arc<MockCrm>,
) -> Processor {
    Processor::new(
        pool.clone(),
        scraper,
        ai,
        crm,
        ProcessorConfig {
            poll_interval: Duration::from_millis(50),
            ..Default::default()
        },
    )
}

/// A well-formed AI reply matching the extraction schema.
pub fn ai_reply() -> String {
    r#"{
        "company_data": {"name": "Acme"},
        "people": [],
        "services": {"company_overview": "Acme makes widgets."},
        "quality_signals": ["Established widget brand"],
        "growth_signals": [],
        "industry_metrics": []
    }"#
    .to_string()
}
