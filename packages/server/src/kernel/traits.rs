// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic. What to crawl,
// what to prompt for, and how to map extraction output onto the CRM lives
// with the processor and the CRM sub-stepper.
//
// Naming convention: Base* for trait names (e.g., BaseAI, BaseWebScraper)

use anyhow::Result;
use async_trait::async_trait;

/// Result of a multi-page website crawl.
#[derive(Debug, Clone, Default)]
pub struct CrawlResult {
    /// Extracted text, one entry per visited page.
    pub content: Vec<String>,
    pub emails: Vec<String>,
    pub links: Vec<String>,
    pub pages_visited: u32,
}

#[async_trait]
pub trait BaseWebScraper: Send + Sync {
    /// Crawl a website breadth-first up to the given depth and page budget.
    async fn crawl(&self, url: &str, max_depth: u32, max_pages: u32) -> Result<CrawlResult>;
}

#[async_trait]
pub trait BaseAI: Send + Sync {
    /// Complete a prompt expecting a JSON response (returns the raw reply).
    /// Parse with serde_json in calling code.
    async fn complete_json(&self, prompt: &str) -> Result<String>;
}

/// CRM operations the sync sub-stepper depends on. The production
/// implementation wraps the `twenty` client crate.
#[async_trait]
pub trait BaseCrm: Send + Sync {
    /// Create person records attached to a company, best-effort per record.
    /// Returns the number created.
    async fn create_people(&self, company_id: &str, people: &[twenty::Person]) -> Result<usize>;

    /// Partial-patch a company record; unset fields must not be overwritten.
    async fn update_company(&self, company_id: &str, fields: &twenty::CompanyFields)
        -> Result<()>;

    /// Create a note and link it to a company. `None` means the note was
    /// created but could not be linked back.
    async fn create_note_with_target(
        &self,
        company_id: &str,
        title: &str,
        body: &str,
    ) -> Result<Option<String>>;
}
