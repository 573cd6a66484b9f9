//! CRM sync sub-stepper.
//!
//! Runs the four Twenty sub-steps in fixed order: contact creation, company
//! update, notes addition, custom fields. Each sub-step is skipped when its
//! `CrmProgress` flag is already set, and every completed sub-step persists
//! the updated progress immediately, so a failure or crash mid-sync resumes
//! at the first unfinished sub-step. A sub-step error aborts the remaining
//! sub-steps and surfaces as a stage failure.

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use twenty::{CompanyFields, Emails, LinkField, Person, PersonName, Phones};

use crate::common::{AiAnalysis, CrmTraceEntry, ProcessedData};
use crate::domains::company::Company;

use super::BaseCrm;

#[derive(Clone)]
pub struct CrmSync {
    crm: Arc<dyn BaseCrm>,
}

impl CrmSync {
    pub fn new(crm: Arc<dyn BaseCrm>) -> Self {
        Self { crm }
    }

    pub async fn run(
        &self,
        company: &Company,
        processed: &mut ProcessedData,
        pool: &SqlitePool,
    ) -> Result<()> {
        let company_id = company.company_id.as_str();
        tracing::info!(company_id, "Starting CRM sync");

        let analysis = AiAnalysis::from_value(&processed.ai_result);

        if !processed.crm_progress.contact_created {
            let people = build_people(&analysis);
            let created = self
                .crm
                .create_people(company_id, &people)
                .await
                .context("contact creation failed")?;

            processed.crm_trace.push(CrmTraceEntry {
                sub_step: "contact_created".to_string(),
                request: serde_json::to_value(&people).unwrap_or_default(),
                response: json!({ "created": created }),
            });
            processed.crm_progress.contact_created = true;
            Company::save_crm_progress(company_id, processed, pool).await?;
            tracing::info!(company_id, created, "CRM sub-step done: contact creation");
        } else {
            tracing::info!(company_id, "Skipping contact creation (already completed)");
        }

        if !processed.crm_progress.company_updated {
            let fields = build_company_fields(&analysis);
            self.crm
                .update_company(company_id, &fields)
                .await
                .context("company update failed")?;

            processed.crm_trace.push(CrmTraceEntry {
                sub_step: "company_updated".to_string(),
                request: serde_json::to_value(&fields).unwrap_or_default(),
                response: json!({ "ok": true }),
            });
            processed.crm_progress.company_updated = true;
            Company::save_crm_progress(company_id, processed, pool).await?;
            tracing::info!(company_id, "CRM sub-step done: company update");
        } else {
            tracing::info!(company_id, "Skipping company update (already completed)");
        }

        if !processed.crm_progress.notes_added {
            let title = format!("AI Enrichment - {}", Utc::now().format("%Y-%m-%d"));
            let body = format_note_content(&analysis);
            let note_id = self
                .crm
                .create_note_with_target(company_id, &title, &body)
                .await
                .context("note creation failed")?;

            // A note that exists but has no linkable id is a warning, not a failure.
            if note_id.is_none() {
                tracing::warn!(company_id, "Note created but could not be linked to the company");
            }

            processed.crm_trace.push(CrmTraceEntry {
                sub_step: "notes_added".to_string(),
                request: json!({ "title": title, "body": body }),
                response: json!({ "note_id": note_id }),
            });
            processed.crm_progress.notes_added = true;
            Company::save_crm_progress(company_id, processed, pool).await?;
            tracing::info!(company_id, "CRM sub-step done: notes addition");
        } else {
            tracing::info!(company_id, "Skipping notes addition (already completed)");
        }

        if !processed.crm_progress.custom_fields_updated {
            // No custom field mapping exists on this workspace; the flag is
            // kept so progress tracking stays symmetric across sub-steps.
            processed.crm_trace.push(CrmTraceEntry {
                sub_step: "custom_fields_updated".to_string(),
                request: serde_json::Value::Null,
                response: json!({ "skipped": true }),
            });
            processed.crm_progress.custom_fields_updated = true;
            Company::save_crm_progress(company_id, processed, pool).await?;
        }

        tracing::info!(company_id, "CRM sync completed");
        Ok(())
    }
}

/// Map extracted people onto Twenty person payloads.
fn build_people(analysis: &AiAnalysis) -> Vec<Person> {
    analysis
        .people
        .iter()
        .map(|p| Person {
            emails: non_empty(&p.email).map(|email| Emails {
                primary_email: email,
            }),
            name: non_empty(&p.first_name).map(|first_name| PersonName {
                first_name,
                last_name: non_empty(&p.last_name).unwrap_or_default(),
            }),
            job_title: non_empty(&p.title),
            linkedin_link: non_empty(&p.linkedin).map(LinkField::new),
            x_link: non_empty(&p.twitter).map(LinkField::new),
            phones: non_empty(&p.phone).map(Phones::new),
        })
        .collect()
}

/// Map the extraction result onto a partial company patch. Absent or empty
/// values are left out so the CRM keeps whatever it already has.
fn build_company_fields(analysis: &AiAnalysis) -> CompanyFields {
    let data = &analysis.company_data;
    let services = &analysis.services;

    CompanyFields {
        name: non_empty(&data.name),
        industry: non_empty(&data.industry),
        employees: data.employee_count,
        founded_year: data.founded_year,
        headquarters: non_empty(&data.headquarters),
        linkedin_link: non_empty(&data.linkedin).map(LinkField::new),
        x_link: non_empty(&data.twitter).map(LinkField::new),
        facebook: non_empty(&data.facebook).map(LinkField::new),
        instagram: non_empty(&data.instagram).map(LinkField::new),
        overview: non_empty(&services.company_overview),
        offerings: non_empty(&services.offerings),
        target_market: non_empty(&services.target_market),
        tech_stack: non_empty(&services.tech_stack),
        competitive_intel: non_empty(&services.competitive_intel),
        recent_activity: non_empty(&services.recent_activity),
        quality_signals: non_empty_list(&analysis.quality_signals),
        growth_signals: non_empty_list(&analysis.growth_signals),
        industry_metrics: non_empty_list(&analysis.industry_metrics),
        locations: non_empty_list(&data.other_locations),
    }
}

/// Synthesize a markdown note from the signal lists and free-text fields
/// that have no direct CRM field mapping.
fn format_note_content(analysis: &AiAnalysis) -> String {
    let mut sections = Vec::new();

    if !analysis.quality_signals.is_empty() {
        sections.push(format!(
            "**Quality Signals:**\n{}",
            bullets(&analysis.quality_signals)
        ));
    }
    if !analysis.growth_signals.is_empty() {
        sections.push(format!(
            "**Growth Signals:**\n{}",
            bullets(&analysis.growth_signals)
        ));
    }
    if !analysis.industry_metrics.is_empty() {
        sections.push(format!(
            "**Industry Metrics:**\n{}",
            bullets(&analysis.industry_metrics)
        ));
    }
    if let Some(notes) = non_empty(&analysis.notes) {
        sections.push(format!("**Additional Notes:**\n{}", notes));
    }
    if let Some(key_people) = non_empty(&analysis.services.key_people) {
        sections.push(format!("**Key People:**\n{}", key_people));
    }

    sections.join("\n\n")
}

fn bullets(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("• {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn non_empty_list(items: &[String]) -> Option<Vec<String>> {
    (!items.is_empty()).then(|| items.to_vec())
}
