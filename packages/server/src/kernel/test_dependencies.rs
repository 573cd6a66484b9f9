// Mock implementations of the Base* traits for testing.
//
// Each mock queues canned responses and records the calls it receives, so
// tests can both script collaborator behavior and assert on interactions.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{BaseAI, BaseCrm, BaseWebScraper, CrawlResult};

// =============================================================================
// Mock Web Scraper
// =============================================================================

/// Arguments captured from a crawl call
#[derive(Debug, Clone)]
pub struct CrawlCall {
    pub url: String,
    pub max_depth: u32,
    pub max_pages: u32,
}

#[derive(Default)]
pub struct MockWebScraper {
    responses: Mutex<VecDeque<Result<CrawlResult, String>>>,
    calls: Mutex<Vec<CrawlCall>>,
}

impl MockWebScraper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful single-page crawl returning the given text.
    pub fn with_content(self, content: &str) -> Self {
        self.responses.lock().unwrap().push_back(Ok(CrawlResult {
            content: vec![content.to_string()],
            pages_visited: 1,
            ..Default::default()
        }));
        self
    }

    pub fn with_failure(self, error: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(error.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<CrawlCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseWebScraper for MockWebScraper {
    async fn crawl(&self, url: &str, max_depth: u32, max_pages: u32) -> Result<CrawlResult> {
        self.calls.lock().unwrap().push(CrawlCall {
            url: url.to_string(),
            max_depth,
            max_pages,
        });
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(result)) => Ok(result),
            Some(Err(e)) => Err(anyhow::anyhow!(e)),
            None => Err(anyhow::anyhow!("MockWebScraper has no queued response")),
        }
    }
}

// =============================================================================
// Mock AI
// =============================================================================

#[derive(Default)]
pub struct MockAI {
    responses: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockAI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, reply: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(reply.to_string()));
        self
    }

    pub fn with_failure(self, error: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(error.to_string()));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseAI for MockAI {
    async fn complete_json(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(e)) => Err(anyhow::anyhow!(e)),
            None => Err(anyhow::anyhow!("MockAI has no queued response")),
        }
    }
}

// =============================================================================
// Mock CRM
// =============================================================================

#[derive(Default)]
pub struct MockCrm {
    fail_create_people: Mutex<Option<String>>,
    fail_update_company: Mutex<Option<String>>,
    fail_create_note: Mutex<Option<String>>,
    unlinkable_note: Mutex<bool>,
    calls: Mutex<Vec<String>>,
}

impl MockCrm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_create_people_failure(self, error: &str) -> Self {
        *self.fail_create_people.lock().unwrap() = Some(error.to_string());
        self
    }

    pub fn with_update_company_failure(self, error: &str) -> Self {
        *self.fail_update_company.lock().unwrap() = Some(error.to_string());
        self
    }

    pub fn with_create_note_failure(self, error: &str) -> Self {
        *self.fail_create_note.lock().unwrap() = Some(error.to_string());
        self
    }

    /// Make note creation succeed without returning a linkable id.
    pub fn with_unlinkable_note(self) -> Self {
        *self.unlinkable_note.lock().unwrap() = true;
        self
    }

    /// Operation names in invocation order, e.g. `create_people:2`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseCrm for MockCrm {
    async fn create_people(&self, _company_id: &str, people: &[twenty::Person]) -> Result<usize> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("create_people:{}", people.len()));
        if let Some(error) = self.fail_create_people.lock().unwrap().clone() {
            anyhow::bail!(error);
        }
        Ok(people.len())
    }

    async fn update_company(
        &self,
        _company_id: &str,
        _fields: &twenty::CompanyFields,
    ) -> Result<()> {
        self.calls.lock().unwrap().push("update_company".to_string());
        if let Some(error) = self.fail_update_company.lock().unwrap().clone() {
            anyhow::bail!(error);
        }
        Ok(())
    }

    async fn create_note_with_target(
        &self,
        _company_id: &str,
        _title: &str,
        _body: &str,
    ) -> Result<Option<String>> {
        self.calls.lock().unwrap().push("create_note".to_string());
        if let Some(error) = self.fail_create_note.lock().unwrap().clone() {
            anyhow::bail!(error);
        }
        if *self.unlinkable_note.lock().unwrap() {
            Ok(None)
        } else {
            Ok(Some("note-1".to_string()))
        }
    }
}
