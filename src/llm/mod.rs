// src/llm/mod.rs
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

pub mod gemini;
pub mod json;

pub use gemini::GeminiClient;
pub use json::parse_json_response;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned no text")]
    EmptyResponse,

    #[error("LLM response is not a JSON object: {0}")]
    InvalidJson(String),

    #[error("File upload failed: {0}")]
    Upload(String),

    #[error("{0}")]
    Unsupported(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Network(err.to_string())
    }
}

/// A document held by the provider, referenced from requests by `uri`
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    /// Provider id, e.g. `files/abc123`
    pub name: String,
    pub uri: String,
    pub display_name: String,
    pub mime_type: String,
}

/// One single-turn completion call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub user: String,
    pub temperature: Option<f32>,
    /// Let the model fetch URLs mentioned in the prompt itself
    pub url_context: bool,
    /// Ask for an `application/json` response body
    pub json_output: bool,
    /// Uploaded documents sent ahead of the user text
    pub files: Vec<UploadedFile>,
}

impl CompletionRequest {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            ..Default::default()
        }
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_url_context(mut self) -> Self {
        self.url_context = true;
        self
    }

    pub fn json_output(mut self) -> Self {
        self.json_output = true;
        self
    }

    pub fn attach(mut self, files: &[UploadedFile]) -> Self {
        self.files.extend_from_slice(files);
        self
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;

    fn model(&self) -> &str;

    /// Upload a local document so later requests can attach it
    async fn upload_file(&self, path: &Path, _mime_type: &str) -> Result<UploadedFile, LlmError> {
        Err(LlmError::Unsupported(format!(
            "{} does not accept file uploads ({})",
            self.model(),
            path.display()
        )))
    }

    async fn delete_file(&self, _file: &UploadedFile) -> Result<(), LlmError> {
        Ok(())
    }
}
