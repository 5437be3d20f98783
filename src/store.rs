// src/store.rs
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::core::database::{Collection, DocumentRepository, StoredDocument};
use crate::core::Database;
use crate::profile::{self, UNKNOWN};
use crate::utils::normalize_name;

/// Profile and comparison documents, keyed by company / applicant name
pub struct ProfileStore {
    db: Database,
}

impl ProfileStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn connect(uri: &str, name: &str) -> Result<Self> {
        Ok(Self::new(Database::connect(uri, name).await?))
    }

    fn repository(&self) -> DocumentRepository<'_> {
        DocumentRepository::new(self.db.pool())
    }

    pub async fn health_check(&self) -> Result<()> {
        self.db.health_check().await
    }

    pub async fn close(&self) {
        self.db.close().await;
    }

    pub async fn save_company_profile(&self, profile: &Value) -> Result<String> {
        let name = profile::company_name(profile).unwrap_or_else(|| {
            warn!("Company profile has no name, storing as '{}'", UNKNOWN);
            UNKNOWN.to_string()
        });
        self.save(Collection::Companies, &name, None, profile).await
    }

    pub async fn get_company_profile(&self, company_name: &str) -> Result<Option<Value>> {
        self.latest(Collection::Companies, company_name).await
    }

    /// Company profiles whose name contains `fragment`, ignoring case
    pub async fn find_similar_companies(&self, fragment: &str) -> Result<Vec<Value>> {
        let documents = self
            .repository()
            .search_by_name(Collection::Companies, &normalize_name(fragment))
            .await?;
        to_values(documents)
    }

    pub async fn save_applicant_profile(&self, profile: &Value) -> Result<String> {
        let name = profile::applicant_name(profile).unwrap_or_else(|| {
            warn!("Applicant profile has no name, storing as '{}'", UNKNOWN);
            UNKNOWN.to_string()
        });
        self.save(Collection::Applicants, &name, None, profile).await
    }

    pub async fn get_applicant_profile(&self, applicant_name: &str) -> Result<Option<Value>> {
        self.latest(Collection::Applicants, applicant_name).await
    }

    pub async fn save_comparison(
        &self,
        company_name: &str,
        applicant_name: &str,
        comparison: &Value,
    ) -> Result<String> {
        self.save(
            Collection::Comparisons,
            &normalize_name(company_name),
            Some(&normalize_name(applicant_name)),
            comparison,
        )
        .await
    }

    pub async fn comparisons_by_company(&self, company_name: &str) -> Result<Vec<Value>> {
        let documents = self
            .repository()
            .list_by_name(Collection::Comparisons, &normalize_name(company_name))
            .await?;
        to_values(documents)
    }

    pub async fn comparisons_by_applicant(&self, applicant_name: &str) -> Result<Vec<Value>> {
        let documents = self
            .repository()
            .list_by_related_name(Collection::Comparisons, &normalize_name(applicant_name))
            .await?;
        to_values(documents)
    }

    async fn save(
        &self,
        collection: Collection,
        name: &str,
        related_name: Option<&str>,
        document: &Value,
    ) -> Result<String> {
        let mut body: Map<String, Value> = document
            .as_object()
            .cloned()
            .with_context(|| format!("Only JSON objects can be stored in {}", collection.name()))?;

        let id = self
            .repository()
            .insert(collection, name, related_name, &mut body)
            .await?;

        info!("Saved {} '{}' as {}", collection.name(), name, id);
        Ok(id)
    }

    async fn latest(&self, collection: Collection, name: &str) -> Result<Option<Value>> {
        self.repository()
            .latest_by_name(collection, &normalize_name(name))
            .await?
            .map(StoredDocument::into_value)
            .transpose()
    }
}

fn to_values(documents: Vec<StoredDocument>) -> Result<Vec<Value>> {
    documents.into_iter().map(StoredDocument::into_value).collect()
}
