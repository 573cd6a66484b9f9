//! Background processor driving queued companies through the enrichment
//! pipeline.
//!
//! A single polling loop wakes on a fixed interval, fetches every company
//! that is not yet finished (oldest first), and runs each one through the
//! remaining pipeline stages, strictly one company at a time:
//!
//! ```text
//! Processor tick (every poll_interval)
//!     │
//!     ├─► find_unfinished() — status pending/processing, step != completed
//!     └─► For each company, in order:
//!             crawl      (skipped when raw_data already present)
//!             ai_extract (skipped when processed_data already present)
//!             crm_sync   (sub-steps tracked in crm_progress)
//! ```
//!
//! Which stages run is decided by data presence, not by `current_step`
//! alone: a job that failed (or the process crashed) resumes exactly where
//! its data says it stopped. A stage failure marks the job failed, logs one
//! `failed` audit entry for that stage, leaves `current_step` where it was,
//! and never escapes the polling loop. Failed jobs are not retried until an
//! explicit restart re-queues them.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::common::ProcessedData;
use crate::domains::company::{
    Company, CompanyStatus, LogStatus, LogStep, PipelineStep, ProcessLog,
};
use crate::kernel::enrichment;

use super::crm_sync::CrmSync;
use super::{BaseAI, BaseCrm, BaseWebScraper};

/// Configuration for the background processor.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// How often to look for unfinished jobs.
    pub poll_interval: Duration,
    pub crawl_max_depth: u32,
    pub crawl_max_pages: u32,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            crawl_max_depth: 2,
            crawl_max_pages: 10,
        }
    }
}

/// A stage error together with the audit-log step it belongs to.
struct StageFailure {
    step: LogStep,
    error: anyhow::Error,
}

impl StageFailure {
    fn new(step: LogStep, error: impl Into<anyhow::Error>) -> Self {
        Self {
            step,
            error: error.into(),
        }
    }
}

#[derive(Clone)]
pub struct Processor {
    pool: SqlitePool,
    scraper: Arc<dyn BaseWebScraper>,
    ai: Arc<dyn BaseAI>,
    crm_sync: CrmSync,
    config: ProcessorConfig,
    /// Guards against overlapping passes; a tick that finds the previous
    /// pass still running skips instead of queueing behind it.
    pass_guard: Arc<Mutex<()>>,
    shutdown: CancellationToken,
}

impl Processor {
    pub fn new(
        pool: SqlitePool,
        scraper: Arc<dyn BaseWebScraper>,
        ai: Arc<dyn BaseAI>,
        crm: Arc<dyn BaseCrm>,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            pool,
            scraper,
            ai,
            crm_sync: CrmSync::new(crm),
            config,
            pass_guard: Arc::new(Mutex::new(())),
            shutdown: CancellationToken::new(),
        }
    }

    /// Start the polling loop. Returns the handle of the spawned task; await
    /// it after [`stop`](Self::stop) to let an in-flight pass finish.
    pub fn start(&self) -> JoinHandle<()> {
        let processor = self.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(processor.config.poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            info!(
                interval_secs = processor.config.poll_interval.as_secs(),
                "Background processor started"
            );

            loop {
                tokio::select! {
                    _ = processor.shutdown.cancelled() => break,
                    _ = interval.tick() => processor.process_pending().await,
                }
            }

            info!("Background processor stopped");
        })
    }

    /// Request shutdown. The current pass, if any, runs to completion; no
    /// further ticks fire.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    /// One processing pass over all unfinished jobs. Public so tests (and
    /// manual triggers) can drive the pipeline without waiting on the tick.
    pub async fn process_pending(&self) {
        let Ok(_guard) = self.pass_guard.try_lock() else {
            debug!("Previous pass still running, skipping tick");
            return;
        };

        let companies = match Company::find_unfinished(&self.pool).await {
            Ok(companies) => companies,
            Err(e) => {
                error!(error = %e, "Failed to query unfinished companies");
                return;
            }
        };

        if companies.is_empty() {
            return;
        }

        info!(count = companies.len(), "Processing unfinished companies");

        for company in companies {
            self.process_company(&company).await;
        }
    }

    /// Run one company through its remaining stages, converting any stage
    /// error into a failed status plus one audit entry.
    async fn process_company(&self, company: &Company) {
        info!(
            company_id = %company.company_id,
            step = ?company.current_step,
            "Processing company"
        );

        let Err(failure) = self.run_stages(company).await else {
            info!(company_id = %company.company_id, "Company processed successfully");
            return;
        };

        error!(
            company_id = %company.company_id,
            step = ?failure.step,
            error = %format!("{:#}", failure.error),
            "Company processing failed"
        );

        if let Err(e) = Company::mark_failed(&company.company_id, &self.pool).await {
            error!(company_id = %company.company_id, error = %e, "Failed to mark company failed");
        }

        let message = format!("Processing failed: {:#}", failure.error);
        if let Err(e) = ProcessLog::append(
            &company.company_id,
            failure.step,
            LogStatus::Failed,
            &message,
            None,
            &self.pool,
        )
        .await
        {
            error!(company_id = %company.company_id, error = %e, "Failed to record failure log");
        }
    }

    async fn run_stages(&self, company: &Company) -> Result<(), StageFailure> {
        let mut company = company.clone();

        if company.status == CompanyStatus::Pending {
            Company::mark_processing(&company.company_id, &self.pool)
                .await
                .map_err(|e| StageFailure::new(company.next_log_step(), e))?;
        }

        if company.raw_data.is_none() {
            self.run_crawl_stage(&mut company)
                .await
                .map_err(|e| StageFailure::new(LogStep::Crawling, e))?;
        }

        if company.processed_data.is_none() {
            self.run_ai_stage(&mut company)
                .await
                .map_err(|e| StageFailure::new(LogStep::AiProcessing, e))?;
        }

        if company.current_step == PipelineStep::CrmSending {
            self.run_crm_stage(&mut company)
                .await
                .map_err(|e| StageFailure::new(LogStep::CrmSending, e))?;
        }

        Ok(())
    }

    async fn run_crawl_stage(&self, company: &mut Company) -> Result<()> {
        Company::set_current_step(&company.company_id, PipelineStep::Crawling, &self.pool).await?;
        ProcessLog::append(
            &company.company_id,
            LogStep::Crawling,
            LogStatus::Started,
            "Starting website crawl",
            None,
            &self.pool,
        )
        .await?;

        let result = self
            .scraper
            .crawl(
                &company.website_url,
                self.config.crawl_max_depth,
                self.config.crawl_max_pages,
            )
            .await?;

        let raw_data = result.content.join("\n\n");
        if raw_data.trim().is_empty() {
            anyhow::bail!("crawl returned no content for {}", company.website_url);
        }

        let updated = Company::store_raw_data(&company.company_id, &raw_data, &self.pool).await?;
        ProcessLog::append(
            &company.company_id,
            LogStep::Crawling,
            LogStatus::Completed,
            "Website crawl completed",
            Some(&format!(
                "{} characters extracted from {} pages",
                raw_data.len(),
                result.pages_visited
            )),
            &self.pool,
        )
        .await?;

        *company = updated;
        Ok(())
    }

    async fn run_ai_stage(&self, company: &mut Company) -> Result<()> {
        Company::set_current_step(&company.company_id, PipelineStep::AiProcessing, &self.pool)
            .await?;
        ProcessLog::append(
            &company.company_id,
            LogStep::AiProcessing,
            LogStatus::Started,
            "Starting AI processing",
            None,
            &self.pool,
        )
        .await?;

        let raw_data = company
            .raw_data
            .as_deref()
            .context("raw_data missing before AI stage")?;

        let prompt = enrichment::build_prompt(company, raw_data);
        let reply = self.ai.complete_json(&prompt).await?;
        let ai_result = enrichment::parse_analysis(&reply)?;

        let updated = Company::store_processed_data(
            &company.company_id,
            &ProcessedData::new(ai_result),
            &self.pool,
        )
        .await?;
        ProcessLog::append(
            &company.company_id,
            LogStep::AiProcessing,
            LogStatus::Completed,
            "AI processing completed",
            Some("Structured data extracted"),
            &self.pool,
        )
        .await?;

        *company = updated;
        Ok(())
    }

    async fn run_crm_stage(&self, company: &mut Company) -> Result<()> {
        ProcessLog::append(
            &company.company_id,
            LogStep::CrmSending,
            LogStatus::Started,
            "Starting CRM sync",
            None,
            &self.pool,
        )
        .await?;

        let mut processed = company
            .processed()
            .cloned()
            .context("processed_data missing before CRM sync")?;

        self.crm_sync
            .run(company, &mut processed, &self.pool)
            .await?;

        Company::mark_completed(&company.company_id, &self.pool).await?;
        ProcessLog::append(
            &company.company_id,
            LogStep::CrmSending,
            LogStatus::Completed,
            "CRM sync completed",
            Some(&format!(
                "{} sub-step payloads recorded",
                processed.crm_trace.len()
            )),
            &self.pool,
        )
        .await?;

        company.status = CompanyStatus::Completed;
        company.current_step = PipelineStep::Completed;
        Ok(())
    }
}
