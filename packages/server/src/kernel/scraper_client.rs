//! Client for the external scraping API.
//!
//! The crawler itself runs as a separate service; this client posts a crawl
//! request and gets back the extracted text of every visited page. A
//! `success: false` payload and a transport error are treated identically by
//! the processor: the crawl stage failed.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{BaseWebScraper, CrawlResult};

/// Crawls can take a while on deep sites; keep the timeout generous.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

pub struct ScraperApiClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
    max_depth: u32,
    max_pages: u32,
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    success: bool,
    #[serde(default)]
    content: Vec<String>,
    #[serde(default)]
    emails: Vec<String>,
    #[serde(default)]
    links: Vec<String>,
    #[serde(default, rename = "pagesVisited")]
    pages_visited: u32,
    error: Option<String>,
}

impl ScraperApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl BaseWebScraper for ScraperApiClient {
    async fn crawl(&self, url: &str, max_depth: u32, max_pages: u32) -> Result<CrawlResult> {
        tracing::info!(url, max_depth, max_pages, "Requesting crawl from scraper API");

        let response = self
            .client
            .post(format!("{}/scrape", self.base_url))
            .json(&ScrapeRequest {
                url,
                max_depth,
                max_pages,
            })
            .send()
            .await
            .context("Scrape request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("scraper API returned {}: {}", status, body);
        }

        let body: ScrapeResponse = response
            .json()
            .await
            .context("Invalid scraper API response")?;

        if !body.success {
            anyhow::bail!(
                "scrape failed: {}",
                body.error.unwrap_or_else(|| "unknown error".to_string())
            );
        }

        tracing::info!(url, pages_visited = body.pages_visited, "Crawl completed");

        Ok(CrawlResult {
            content: body.content,
            emails: body.emails,
            links: body.links,
            pages_visited: body.pages_visited,
        })
    }
}
