// src/pipeline/applicant.rs
use anyhow::Context;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use super::{PipelineError, PromptRunner};
use crate::llm::UploadedFile;
use crate::profile;
use crate::prompts::applicant_analyze;
use crate::store::ProfileStore;
use crate::utils::{normalize_name, read_file_content};

const PDF_MIME_TYPE: &str = "application/pdf";

/// Resume / portfolio text or PDFs -> applicant profile
pub struct ApplicantPipeline {
    runner: PromptRunner,
    store: Option<Arc<ProfileStore>>,
}

impl ApplicantPipeline {
    pub fn new(runner: PromptRunner, store: Option<Arc<ProfileStore>>) -> Self {
        Self { runner, store }
    }

    pub async fn analyze(&self, resume_text: &str) -> Result<Map<String, Value>, PipelineError> {
        if resume_text.trim().is_empty() {
            return Err(PipelineError::NoContent);
        }

        self.runner
            .run_json(&applicant_analyze::PROMPT, &[("resume_text", resume_text)])
            .await
    }

    pub async fn run(
        &self,
        resume_text: &str,
        candidate_name: Option<&str>,
    ) -> Result<Value, PipelineError> {
        info!("Analyzing applicant ({} chars)", resume_text.chars().count());
        let analyzed = self.analyze(resume_text).await?;

        let source = json!({ "type": "text", "chars": resume_text.chars().count() });
        self.finish(analyzed, candidate_name, source).await
    }

    pub async fn run_from_file(
        &self,
        path: &Path,
        candidate_name: Option<&str>,
    ) -> Result<Value, PipelineError> {
        let resume_text = read_file_content(path).await?;
        let file_name = display_file_name(path);

        info!("Analyzing applicant from {}", file_name);
        let analyzed = self.analyze(&resume_text).await?;

        let source = json!({ "type": "file", "files": [file_name] });
        self.finish(analyzed, candidate_name, source).await
    }

    /// Upload resume, portfolio and essay PDFs and analyze them in one
    /// request. Uploads are deleted afterwards whatever the outcome.
    pub async fn analyze_pdfs(
        &self,
        paths: &[PathBuf],
    ) -> Result<Map<String, Value>, PipelineError> {
        if paths.is_empty() {
            return Err(PipelineError::NoContent);
        }
        for path in paths {
            if !is_pdf(path) {
                return Err(PipelineError::NotPdf(path.display().to_string()));
            }
            tokio::fs::metadata(path)
                .await
                .with_context(|| format!("File not found: {}", path.display()))?;
        }

        let mut uploaded = Vec::new();
        let result = self.upload_and_analyze(paths, &mut uploaded).await;

        for file in &uploaded {
            if let Err(e) = self.runner.llm().delete_file(file).await {
                warn!("Failed to delete uploaded file {}: {}", file.name, e);
            }
        }

        result
    }

    async fn upload_and_analyze(
        &self,
        paths: &[PathBuf],
        uploaded: &mut Vec<UploadedFile>,
    ) -> Result<Map<String, Value>, PipelineError> {
        for path in paths {
            uploaded.push(self.runner.llm().upload_file(path, PDF_MIME_TYPE).await?);
        }

        let documents = describe_documents(uploaded.as_slice());
        self.runner
            .run_json_with_files(
                &applicant_analyze::PROMPT,
                &[("resume_text", documents.as_str())],
                uploaded.as_slice(),
            )
            .await
    }

    pub async fn run_from_pdfs(
        &self,
        paths: &[PathBuf],
        candidate_name: Option<&str>,
    ) -> Result<Value, PipelineError> {
        info!("Analyzing applicant from {} PDF files", paths.len());
        let analyzed = self.analyze_pdfs(paths).await?;

        let files: Vec<String> = paths.iter().map(|path| display_file_name(path)).collect();
        let source = json!({ "type": "local_pdfs", "files": files });
        self.finish(analyzed, candidate_name, source).await
    }

    async fn finish(
        &self,
        mut analyzed: Map<String, Value>,
        candidate_name: Option<&str>,
        source: Value,
    ) -> Result<Value, PipelineError> {
        // a name given by the caller overrides whatever the model extracted
        if let Some(name) = candidate_name.map(normalize_name).filter(|n| !n.is_empty()) {
            let meta = analyzed
                .entry("profile_meta")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(meta) = meta {
                meta.insert("candidate_name".to_string(), Value::String(name));
            }
        }

        analyzed.insert("_source".to_string(), source);
        let mut result = Value::Object(analyzed);

        for axis in profile::scoring_axes(&result) {
            info!(
                "  {}: {}",
                axis.axis,
                axis.score
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| profile::UNKNOWN.to_string())
            );
        }

        if let Some(ref store) = self.store {
            let id = store.save_applicant_profile(&result).await?;
            result["_id"] = Value::String(id);
        }

        info!(
            "Applicant analysis finished for {}",
            profile::applicant_name(&result).as_deref().unwrap_or(profile::UNKNOWN)
        );
        Ok(result)
    }
}

fn display_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Guess what each document is from its file name
fn document_kind(file_name: &str) -> &'static str {
    let lower = file_name.to_lowercase();
    if lower.contains("resume") || lower.contains("cv") || file_name.contains("이력서") {
        "Resume"
    } else if lower.contains("portfolio") || file_name.contains("포트폴리오") {
        "Portfolio"
    } else if lower.contains("essay")
        || lower.contains("cover")
        || file_name.contains("자기소개서")
        || file_name.contains("자소서")
    {
        "Personal statement"
    } else {
        "Other document"
    }
}

/// Stands in for the resume text when the documents are attached as files
fn describe_documents(files: &[UploadedFile]) -> String {
    let listing: Vec<String> = files
        .iter()
        .enumerate()
        .map(|(i, file)| {
            format!(
                "{}. {} - {}",
                i + 1,
                file.display_name,
                document_kind(&file.display_name)
            )
        })
        .collect();

    format!(
        "The documents are attached as PDF files:\n{}\n\n\
         Combine the evidence from all of them and name the document each \
         evidence quote comes from.",
        listing.join("\n")
    )
}
