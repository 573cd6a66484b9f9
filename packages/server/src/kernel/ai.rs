// AI implementation using Anthropic's Messages API
//
// This is the infrastructure implementation of BaseAI. Business logic (the
// enrichment prompt and result parsing) lives in kernel/enrichment.rs.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::BaseAI;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Cost-effective default for extraction; overridable via CLAUDE_MODEL.
pub const DEFAULT_CLAUDE_MODEL: &str = "claude-3-haiku-20240307";

const MAX_TOKENS: u32 = 4000;
const TEMPERATURE: f32 = 0.3;

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Claude implementation of AI capabilities
pub struct ClaudeClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl ClaudeClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl BaseAI for ClaudeClient {
    async fn complete_json(&self, prompt: &str) -> Result<String> {
        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "Sending prompt to Claude");

        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Anthropic")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Anthropic API returned {}: {}", status, body);
        }

        let body: MessagesResponse = response
            .json()
            .await
            .context("Invalid Anthropic API response")?;

        let text = body
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .map(|block| block.text)
            .context("Anthropic response contained no text block")?;

        Ok(text)
    }
}
