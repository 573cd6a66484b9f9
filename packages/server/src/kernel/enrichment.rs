//! Enrichment prompt construction and AI reply parsing.
//!
//! The prompt asks for one JSON object; models routinely wrap it in prose,
//! so parsing extracts the outermost object before deserializing.

use anyhow::{Context, Result};

use crate::domains::company::Company;

const PROMPT_TEMPLATE: &str = r#"You are a B2B research analyst. Analyze the following company website content and extract structured information about the company.

Company identifier: {{company_id}}
Website: {{website_url}}
Source: {{source_url}}

Website content:
{{content}}

Respond with a single JSON object, no surrounding commentary, using exactly this structure:

{
  "company_data": {
    "name": "...",
    "description": "...",
    "industry": "...",
    "size_category": "startup|smb|mid-market|enterprise",
    "employee_count": 0,
    "employee_range": "...",
    "founded_year": 0,
    "headquarters": "...",
    "other_locations": ["..."],
    "phone": "...",
    "linkedin": "...",
    "twitter": "...",
    "facebook": "...",
    "instagram": "..."
  },
  "people": [
    {
      "email": "...",
      "title": "...",
      "first_name": "...",
      "last_name": "...",
      "phone": "...",
      "linkedin": "...",
      "twitter": "..."
    }
  ],
  "services": {
    "company_overview": "...",
    "offerings": "...",
    "proof_points": "...",
    "target_market": "...",
    "key_people": "...",
    "recent_activity": "...",
    "tech_stack": "...",
    "competitive_intel": "..."
  },
  "quality_signals": ["..."],
  "growth_signals": ["..."],
  "industry_metrics": ["..."],
  "notes": "..."
}

Omit fields you cannot determine from the content rather than guessing. people may be an empty array."#;

/// Fill the prompt template with the company's identity and crawled content.
pub fn build_prompt(company: &Company, content: &str) -> String {
    PROMPT_TEMPLATE
        .replace("{{company_id}}", &company.company_id)
        .replace("{{website_url}}", &company.website_url)
        .replace("{{source_url}}", &company.source_url)
        .replace("{{content}}", content)
}

/// Pull the JSON object out of an AI reply and check the minimum shape the
/// pipeline depends on (`company_data` and `people` must be present).
pub fn parse_analysis(reply: &str) -> Result<serde_json::Value> {
    let start = reply.find('{').context("no JSON object found in AI response")?;
    let end = reply.rfind('}').context("no JSON object found in AI response")?;
    if end < start {
        anyhow::bail!("no JSON object found in AI response");
    }

    let value: serde_json::Value = serde_json::from_str(&reply[start..=end])
        .context("AI response is not valid JSON")?;

    if value.get("company_data").is_none() || value.get("people").is_none() {
        anyhow::bail!("AI response is missing company_data or people");
    }

    Ok(value)
}
