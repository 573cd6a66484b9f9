use serde::{Deserialize, Serialize};

/// Payload stored in `companies.processed_data` once the AI stage has run.
///
/// The extraction output itself is kept as an opaque JSON value; the core
/// only ever reads the handful of fields exposed through [`AiAnalysis`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedData {
    pub ai_result: serde_json::Value,
    #[serde(default)]
    pub crm_progress: CrmProgress,
    /// Request/response payloads of executed CRM sub-steps, for debugging.
    #[serde(default)]
    pub crm_trace: Vec<CrmTraceEntry>,
}

impl ProcessedData {
    pub fn new(ai_result: serde_json::Value) -> Self {
        Self {
            ai_result,
            crm_progress: CrmProgress::default(),
            crm_trace: Vec::new(),
        }
    }
}

/// Per-sub-step completion flags for the CRM sync. Once a flag is true it is
/// never reset; retries only re-attempt sub-steps whose flag is still false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrmProgress {
    #[serde(default)]
    pub contact_created: bool,
    #[serde(default)]
    pub company_updated: bool,
    #[serde(default)]
    pub notes_added: bool,
    #[serde(default)]
    pub custom_fields_updated: bool,
}

impl CrmProgress {
    pub fn all_done(&self) -> bool {
        self.contact_created && self.company_updated && self.notes_added
            && self.custom_fields_updated
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmTraceEntry {
    pub sub_step: String,
    pub request: serde_json::Value,
    pub response: serde_json::Value,
}

/// Typed read-only view over the AI extraction result. Every field is
/// optional/defaulted so a partially conforming result still syncs whatever
/// it does carry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AiAnalysis {
    #[serde(default)]
    pub company_data: CompanyData,
    #[serde(default)]
    pub people: Vec<ExtractedPerson>,
    #[serde(default)]
    pub services: ServiceFields,
    #[serde(default)]
    pub quality_signals: Vec<String>,
    #[serde(default)]
    pub growth_signals: Vec<String>,
    #[serde(default)]
    pub industry_metrics: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl AiAnalysis {
    /// Lenient view over a stored `ai_result` blob; malformed blobs read as
    /// empty rather than failing the sync.
    pub fn from_value(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyData {
    pub name: Option<String>,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub size_category: Option<String>,
    pub employee_count: Option<i64>,
    pub employee_range: Option<String>,
    pub founded_year: Option<i32>,
    pub headquarters: Option<String>,
    #[serde(default)]
    pub other_locations: Vec<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractedPerson {
    pub email: Option<String>,
    pub title: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceFields {
    pub company_overview: Option<String>,
    pub offerings: Option<String>,
    pub proof_points: Option<String>,
    pub target_market: Option<String>,
    pub key_people: Option<String>,
    pub recent_activity: Option<String>,
    pub tech_stack: Option<String>,
    pub competitive_intel: Option<String>,
}
