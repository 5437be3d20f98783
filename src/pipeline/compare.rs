// src/pipeline/compare.rs
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::info;

use super::{PipelineError, PromptRunner};
use crate::profile;
use crate::prompts::culture_compare;
use crate::store::ProfileStore;
use crate::utils::to_pretty_json;

/// Company profile + applicant profile -> per-axis match and overall score
pub struct ComparePipeline {
    runner: PromptRunner,
    store: Option<Arc<ProfileStore>>,
    save_results: bool,
}

impl ComparePipeline {
    pub fn new(runner: PromptRunner, store: Option<Arc<ProfileStore>>) -> Self {
        Self {
            runner,
            store,
            save_results: true,
        }
    }

    /// Keep reading profiles from the store but do not write comparisons back
    pub fn read_only(mut self) -> Self {
        self.save_results = false;
        self
    }

    pub async fn compare(
        &self,
        company: &Value,
        applicant: &Value,
    ) -> Result<Map<String, Value>, PipelineError> {
        let company_profile = to_pretty_json(company);
        let developer_profile = to_pretty_json(applicant);

        self.runner
            .run_json(
                &culture_compare::PROMPT,
                &[
                    ("company_profile", company_profile.as_str()),
                    ("developer_profile", developer_profile.as_str()),
                ],
            )
            .await
    }

    /// Compare and prefix the result with `_meta` naming both sides
    pub async fn run(
        &self,
        company: &Value,
        applicant: &Value,
        company_name: Option<&str>,
        applicant_name: Option<&str>,
    ) -> Result<Value, PipelineError> {
        let company_name = profile::resolve_name(company_name, profile::company_name(company));
        let applicant_name =
            profile::resolve_name(applicant_name, profile::applicant_name(applicant));

        info!("Comparing {} with {}", company_name, applicant_name);
        let comparison = self.compare(company, applicant).await?;

        let meta = json!({
            "company_name": company_name,
            "developer_name": applicant_name,
        });
        let mut result = Value::Object(profile::prepend_field(comparison, "_meta", meta));

        match profile::match_score(&result) {
            Some((score, band)) => info!(
                "Match score {} ({})",
                score,
                band.as_deref().unwrap_or(profile::UNKNOWN)
            ),
            None => info!("Comparison has no overall match score"),
        }

        if let Some(store) = self.store.as_ref().filter(|_| self.save_results) {
            let id = store
                .save_comparison(&company_name, &applicant_name, &result)
                .await?;
            result["_id"] = Value::String(id);
        }

        Ok(result)
    }

    /// Compare the latest stored profiles of a company and an applicant
    pub async fn run_from_db(
        &self,
        company_name: &str,
        applicant_name: &str,
    ) -> Result<Value, PipelineError> {
        let store = self.store.as_ref().ok_or(PipelineError::StoreDisabled)?;

        let company = store.get_company_profile(company_name).await?.ok_or_else(|| {
            PipelineError::ProfileNotFound {
                kind: "Company",
                name: company_name.to_string(),
            }
        })?;

        let applicant = store
            .get_applicant_profile(applicant_name)
            .await?
            .ok_or_else(|| PipelineError::ProfileNotFound {
                kind: "Applicant",
                name: applicant_name.to_string(),
            })?;

        self.run(
            &without_store_fields(company),
            &without_store_fields(applicant),
            Some(company_name),
            Some(applicant_name),
        )
        .await
    }
}

/// Store bookkeeping is noise in a prompt
pub(super) fn without_store_fields(mut document: Value) -> Value {
    if let Value::Object(ref mut map) = document {
        for key in ["_id", "created_at", "updated_at"] {
            map.remove(key);
        }
    }
    document
}
