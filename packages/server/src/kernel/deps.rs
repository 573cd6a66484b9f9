//! Trait adapters wrapping external-service clients.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use twenty::{CompanyFields, Person, TwentyClient};

use super::BaseCrm;

/// Wrapper around TwentyClient that implements the BaseCrm trait
pub struct TwentyAdapter(pub Arc<TwentyClient>);

impl TwentyAdapter {
    pub fn new(client: Arc<TwentyClient>) -> Self {
        Self(client)
    }
}

#[async_trait]
impl BaseCrm for TwentyAdapter {
    async fn create_people(&self, company_id: &str, people: &[Person]) -> Result<usize> {
        Ok(self.0.create_people(company_id, people).await?)
    }

    async fn update_company(&self, company_id: &str, fields: &CompanyFields) -> Result<()> {
        Ok(self.0.update_company(company_id, fields).await?)
    }

    async fn create_note_with_target(
        &self,
        company_id: &str,
        title: &str,
        body: &str,
    ) -> Result<Option<String>> {
        Ok(self
            .0
            .create_note_with_target(company_id, title, body)
            .await?)
    }
}
