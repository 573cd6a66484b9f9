use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

use crate::kernel::DEFAULT_CLAUDE_MODEL;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// API auth token; unset means open access.
    pub auth_token: Option<String>,
    pub scraper_api_url: String,
    pub anthropic_api_key: String,
    pub claude_model: String,
    pub twenty_api_url: String,
    pub twenty_api_key: String,
    pub poll_interval_secs: u64,
    pub crawl_max_depth: u32,
    pub crawl_max_pages: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://enrichment.db".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "20080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            auth_token: env::var("AUTH_TOKEN")
                .ok()
                .filter(|t| !t.is_empty() && t != "change-this-to-your-secure-token"),
            scraper_api_url: env::var("SCRAPER_API_URL")
                .context("SCRAPER_API_URL must be set")?,
            anthropic_api_key: env::var("ANTHROPIC_API_KEY")
                .context("ANTHROPIC_API_KEY must be set")?,
            claude_model: env::var("CLAUDE_MODEL")
                .unwrap_or_else(|_| DEFAULT_CLAUDE_MODEL.to_string()),
            twenty_api_url: env::var("TWENTY_API_URL")
                .context("TWENTY_API_URL must be set")?,
            twenty_api_key: env::var("TWENTY_API_KEY").unwrap_or_default(),
            poll_interval_secs: env::var("POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("POLL_INTERVAL_SECS must be a valid number")?,
            crawl_max_depth: env::var("CRAWL_MAX_DEPTH")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("CRAWL_MAX_DEPTH must be a valid number")?,
            crawl_max_pages: env::var("CRAWL_MAX_PAGES")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("CRAWL_MAX_PAGES must be a valid number")?,
        })
    }
}
