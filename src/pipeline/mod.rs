// src/pipeline/mod.rs
//! Company, applicant and comparison runs. Each one renders a prompt with
//! its schema, calls the LLM and parses a single JSON object back.

use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::llm::{parse_json_response, CompletionRequest, LlmClient, LlmError, UploadedFile};
use crate::prompts::PromptTemplate;
use crate::schema::{schema_for_prompt, SchemaError};

pub mod applicant;
pub mod company;
pub mod compare;
pub mod full;

pub use applicant::ApplicantPipeline;
pub use company::CompanyPipeline;
pub use compare::ComparePipeline;
pub use full::run_full_analysis;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No input text to analyze")]
    NoContent,

    #[error("No URLs given")]
    NoUrls,

    #[error("All {} URLs failed to scrape: {}", .0.len(), .0.join(", "))]
    AllScrapesFailed(Vec<String>),

    #[error("{kind} profile not found: {name}")]
    ProfileNotFound { kind: &'static str, name: String },

    #[error("Document store is disabled")]
    StoreDisabled,

    #[error("Not a PDF file: {0}")]
    NotPdf(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Renders a template, calls the model and decodes its JSON reply
#[derive(Clone)]
pub struct PromptRunner {
    llm: Arc<dyn LlmClient>,
    schemas_dir: PathBuf,
}

impl PromptRunner {
    pub fn new(llm: Arc<dyn LlmClient>, schemas_dir: impl Into<PathBuf>) -> Self {
        Self {
            llm,
            schemas_dir: schemas_dir.into(),
        }
    }

    pub fn llm(&self) -> &Arc<dyn LlmClient> {
        &self.llm
    }

    /// `vars` must hold every template input except `output_schema`
    pub async fn run_json(
        &self,
        template: &PromptTemplate,
        vars: &[(&str, &str)],
    ) -> Result<Map<String, Value>, PipelineError> {
        self.run_json_with_files(template, vars, &[]).await
    }

    /// Same as [`run_json`](Self::run_json) with uploaded documents attached
    pub async fn run_json_with_files(
        &self,
        template: &PromptTemplate,
        vars: &[(&str, &str)],
        files: &[UploadedFile],
    ) -> Result<Map<String, Value>, PipelineError> {
        let schema = schema_for_prompt(&self.schemas_dir, template.schema_file)?;

        let mut all_vars = vars.to_vec();
        all_vars.push(("output_schema", schema.as_str()));
        let human = template.render(&all_vars)?;

        info!(
            "Running prompt {} v{} on {}",
            template.name,
            template.version,
            self.llm.model()
        );
        debug!(
            "Prompt {} is {} chars with {} attached files",
            template.name,
            human.len(),
            files.len()
        );

        let request = CompletionRequest::new(human)
            .system(template.system)
            .json_output()
            .attach(files);
        let response = self.llm.complete(request).await?;

        Ok(parse_json_response(&response)?)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedLlm;
    use crate::prompts::applicant_analyze;

    #[tokio::test]
    async fn test_run_json_injects_schema_and_parses() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            "```json\n{\"profile_meta\": {\"candidate_name\": \"Kim\"}}\n```",
        ]));
        let runner = PromptRunner::new(llm.clone(), testing::schemas_dir());

        let result = runner
            .run_json(&applicant_analyze::PROMPT, &[("resume_text", "Rust dev")])
            .await
            .unwrap();
        assert_eq!(result["profile_meta"]["candidate_name"], "Kim");

        let request = &llm.recorded()[0];
        assert!(request.json_output);
        assert!(request.user.contains("Rust dev"));
        assert!(request.user.contains("applicant_profile.v1"));
        assert_eq!(request.system.as_deref(), Some(applicant_analyze::PROMPT.system));
    }

    #[tokio::test]
    async fn test_missing_schema_dir() {
        let llm = Arc::new(ScriptedLlm::new(vec!["{}"]));
        let runner = PromptRunner::new(llm.clone(), "/nonexistent/schemas");

        let err = runner
            .run_json(&applicant_analyze::PROMPT, &[("resume_text", "x")])
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Schema(SchemaError::NotFound(_))));
        assert!(llm.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_non_json_reply_is_an_error() {
        let llm = Arc::new(ScriptedLlm::new(vec!["Sorry, I cannot help."]));
        let runner = PromptRunner::new(llm, testing::schemas_dir());

        let err = runner
            .run_json(&applicant_analyze::PROMPT, &[("resume_text", "x")])
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Llm(LlmError::InvalidJson(_))));
    }

    #[test]
    fn test_error_messages() {
        let err = PipelineError::AllScrapesFailed(vec!["https://a".into(), "https://b".into()]);
        assert_eq!(
            err.to_string(),
            "All 2 URLs failed to scrape: https://a, https://b"
        );
        let err = PipelineError::ProfileNotFound {
            kind: "Company",
            name: "토스".into(),
        };
        assert_eq!(err.to_string(), "Company profile not found: 토스");
    }
}
