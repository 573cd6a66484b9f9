// Company Enrichment Service
//
// Accepts companies over a webhook API, crawls their websites via an external
// scraping service, extracts structured data with an AI model, and syncs the
// results into the Twenty CRM. A single background processor drives each
// company through the pipeline with resumable, per-stage progress tracking.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
