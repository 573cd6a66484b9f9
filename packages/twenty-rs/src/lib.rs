//! Pure Twenty CRM REST API client.
//!
//! A minimal client for the Twenty platform's REST API. Supports patching
//! company records, creating people, and creating notes linked to companies.
//!
//! # Example
//!
//! ```rust,ignore
//! use twenty::{CompanyFields, TwentyClient};
//!
//! let client = TwentyClient::new("https://crm.example.com", "api-key");
//!
//! let patch = CompanyFields {
//!     name: Some("Acme".into()),
//!     ..Default::default()
//! };
//! client.update_company("123e4567-e89b-12d3-a456-426614174000", &patch).await?;
//! ```

pub mod error;
pub mod types;

pub use error::{Result, TwentyError};
pub use types::{
    CompanyFields, Emails, LinkField, Note, NoteBody, NoteTarget, Person, PersonName, Phones,
};

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

pub struct TwentyClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TwentyClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<Value> {
        if self.api_key.is_empty() {
            return Err(TwentyError::MissingApiKey);
        }

        let url = format!("{}/rest/{}", self.base_url, endpoint);
        tracing::debug!(%url, method = %method, "Twenty API request");

        let mut req = self
            .client
            .request(method, &url)
            .bearer_auth(&self.api_key);
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), %message, "Twenty API error");
            return Err(TwentyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = resp.text().await?;
        if text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::Null))
    }

    /// Patch a company record with the given fields. Unset fields are not
    /// sent, so existing CRM values are preserved.
    pub async fn update_company(&self, company_id: &str, fields: &CompanyFields) -> Result<()> {
        if !is_valid_uuid(company_id) {
            return Err(TwentyError::InvalidCompanyId(company_id.to_string()));
        }

        tracing::info!(company_id, "Updating Twenty company record");
        self.request(
            Method::PATCH,
            &format!("companies/{}", company_id),
            Some(fields),
        )
        .await?;
        Ok(())
    }

    /// Create person records attached to a company, one request per person.
    /// A single person's failure is logged and skipped rather than aborting
    /// the batch. Returns the number of records created.
    pub async fn create_people(&self, company_id: &str, people: &[Person]) -> Result<usize> {
        if people.is_empty() {
            tracing::info!(company_id, "No people to create");
            return Ok(0);
        }
        if !is_valid_uuid(company_id) {
            return Err(TwentyError::InvalidCompanyId(company_id.to_string()));
        }

        tracing::info!(company_id, count = people.len(), "Creating people");

        let mut created = 0;
        for person in people {
            let mut payload = serde_json::to_value(person)?;
            payload["companyId"] = Value::String(company_id.to_string());

            match self.request(Method::POST, "people", Some(&payload)).await {
                Ok(_) => {
                    tracing::debug!(name = %person.display_name(), "Created person");
                    created += 1;
                }
                Err(e) => {
                    tracing::warn!(name = %person.display_name(), error = %e, "Failed to create person, continuing with batch");
                }
            }
        }
        Ok(created)
    }

    /// Create a note and link it to a company. Returns the note id when one
    /// could be extracted from the create response; `None` means the note
    /// exists but could not be linked (callers treat this as a soft warning).
    pub async fn create_note_with_target(
        &self,
        company_id: &str,
        title: &str,
        body: &str,
    ) -> Result<Option<String>> {
        if !is_valid_uuid(company_id) {
            return Err(TwentyError::InvalidCompanyId(company_id.to_string()));
        }

        let note = Note {
            title: title.to_string(),
            body_v2: NoteBody {
                markdown: body.to_string(),
            },
        };

        let resp = self.request(Method::POST, "notes", Some(&note)).await?;

        let Some(note_id) = extract_note_id(&resp) else {
            tracing::warn!(company_id, "Note created but no id in response, skipping link");
            return Ok(None);
        };

        let target = NoteTarget {
            note_id: note_id.clone(),
            company_id: company_id.to_string(),
        };
        self.request(Method::POST, "noteTargets", Some(&target))
            .await?;

        tracing::info!(company_id, note_id, "Note created and linked to company");
        Ok(Some(note_id))
    }
}

/// Twenty returns created records in a few different envelope shapes
/// depending on endpoint version; try each known location for the id.
fn extract_note_id(resp: &Value) -> Option<String> {
    resp.pointer("/data/createNote/id")
        .or_else(|| resp.pointer("/data/notes/0/id"))
        .or_else(|| resp.pointer("/data/id"))
        .or_else(|| resp.pointer("/id"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn is_valid_uuid(id: &str) -> bool {
    let bytes = id.as_bytes();
    if bytes.len() != 36 {
        return false;
    }
    bytes.iter().enumerate().all(|(i, b)| match i {
        8 | 13 | 18 | 23 => *b == b'-',
        _ => b.is_ascii_hexdigit(),
    })
}
