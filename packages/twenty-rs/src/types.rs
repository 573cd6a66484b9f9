use serde::{Deserialize, Serialize};

/// Link object used by Twenty for social/web URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkField {
    pub primary_link_url: String,
    #[serde(default)]
    pub primary_link_label: String,
}

impl LinkField {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            primary_link_url: url.into(),
            primary_link_label: String::new(),
        }
    }
}

/// Partial patch for a company record. Every field is optional and omitted
/// from the request body when unset, so an update never overwrites existing
/// CRM values with empties.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employees: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub founded_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headquarters: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin_link: Option<LinkField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_link: Option<LinkField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook: Option<LinkField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<LinkField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offerings: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_market: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitive_intel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_activity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_signals: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_signals: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry_metrics: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<String>>,
}

impl CompanyFields {
    /// True when no field is set; callers can skip the PATCH entirely.
    pub fn is_empty(&self) -> bool {
        serde_json::to_value(self)
            .map(|v| v.as_object().map(|o| o.is_empty()).unwrap_or(true))
            .unwrap_or(true)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Emails {
    pub primary_email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonName {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Phones {
    pub primary_phone_number: String,
    pub primary_phone_country_code: String,
    pub primary_phone_calling_code: String,
}

impl Phones {
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            primary_phone_number: number.into(),
            primary_phone_country_code: String::new(),
            primary_phone_calling_code: String::new(),
        }
    }
}

/// A person record to create. The client injects `companyId` when sending.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emails: Option<Emails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<PersonName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin_link: Option<LinkField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_link: Option<LinkField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phones: Option<Phones>,
}

impl Person {
    /// Display name for logging.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(n) => format!("{} {}", n.first_name, n.last_name).trim().to_string(),
            None => "(unnamed)".to_string(),
        }
    }
}

/// Note payload. Twenty's RichTextV2 requires the markdown field.
#[derive(Debug, Clone, Serialize)]
pub struct Note {
    pub title: String,
    #[serde(rename = "bodyV2")]
    pub body_v2: NoteBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoteBody {
    pub markdown: String,
}

/// Joins a note to a company record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteTarget {
    pub note_id: String,
    pub company_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_fields_skip_unset() {
        let fields = CompanyFields {
            name: Some("Acme".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&fields).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["name"], "Acme");
    }

    #[test]
    fn company_fields_empty_check() {
        assert!(CompanyFields::default().is_empty());
        assert!(!CompanyFields {
            industry: Some("Technology".to_string()),
            ..Default::default()
        }
        .is_empty());
    }

    #[test]
    fn person_serializes_camel_case() {
        let person = Person {
            name: Some(PersonName {
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
            }),
            job_title: Some("CEO".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&person).unwrap();
        assert_eq!(value["name"]["firstName"], "Jane");
        assert_eq!(value["jobTitle"], "CEO");
        assert!(value.get("emails").is_none());
    }
}
