// src/llm/gemini.rs
//! Gemini `generateContent` REST client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use super::{CompletionRequest, LlmClient, LlmError, UploadedFile};
use crate::core::config_manager::LlmConfig;

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

const FILE_POLL_INTERVAL: Duration = Duration::from_secs(2);
const FILE_MAX_WAIT: Duration = Duration::from_secs(60);

// ===== Wire types =====

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_data: Option<FileData>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct FileData {
    mime_type: String,
    file_uri: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    url_context: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

/// Files API resource
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    name: String,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileEnvelope {
    file: FileResource,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl GeminiClient {
    pub fn new(
        api_key: &str,
        model: &str,
        base_url: &str,
        temperature: f32,
        timeout_seconds: u64,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature,
        })
    }

    pub fn from_config(config: &LlmConfig) -> anyhow::Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("GOOGLE_API_KEY is not set"))?;

        Ok(Self::new(
            api_key,
            &config.model,
            &config.api_url,
            config.temperature,
            config.timeout_seconds,
        )?)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn upload_endpoint(&self) -> String {
        format!("{}/upload/v1beta/files", self.base_url)
    }

    fn file_endpoint(&self, name: &str) -> String {
        format!("{}/v1beta/{}", self.base_url, name)
    }

    fn build_body(&self, request: CompletionRequest) -> GenerateContentRequest {
        let text_part = |text: String| Part {
            text: Some(text),
            file_data: None,
        };

        // documents go ahead of the instructions that refer to them
        let mut parts: Vec<Part> = request
            .files
            .into_iter()
            .map(|file| Part {
                text: None,
                file_data: Some(FileData {
                    mime_type: file.mime_type,
                    file_uri: file.uri,
                }),
            })
            .collect();
        parts.push(text_part(request.user));

        GenerateContentRequest {
            system_instruction: request.system.map(|s| Content {
                role: None,
                parts: vec![text_part(s)],
            }),
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature.unwrap_or(self.temperature),
                response_mime_type: request.json_output.then_some("application/json"),
            },
            tools: if request.url_context {
                vec![Tool {
                    url_context: serde_json::json!({}),
                }]
            } else {
                Vec::new()
            },
        }
    }

    async fn get_file(&self, name: &str) -> Result<FileResource, LlmError> {
        let response = self
            .client
            .get(self.file_endpoint(name))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), raw));
        }
        Ok(response.json().await?)
    }

    /// Poll until the file leaves `PROCESSING` or the wait runs out
    async fn wait_until_processed(
        &self,
        mut file: FileResource,
    ) -> Result<FileResource, LlmError> {
        let deadline = Instant::now() + FILE_MAX_WAIT;
        while file.state.as_deref() == Some("PROCESSING") && Instant::now() < deadline {
            debug!("Waiting for {} to be processed", file.name);
            tokio::time::sleep(FILE_POLL_INTERVAL).await;
            file = self.get_file(&file.name).await?;
        }
        Ok(file)
    }
}

/// An uploaded file can only be attached once Gemini reports it `ACTIVE`
fn into_uploaded(
    file: FileResource,
    display_name: &str,
    mime_type: &str,
) -> Result<UploadedFile, LlmError> {
    match file.state.as_deref() {
        Some("ACTIVE") => Ok(UploadedFile {
            name: file.name,
            uri: file.uri,
            display_name: display_name.to_string(),
            mime_type: file.mime_type.unwrap_or_else(|| mime_type.to_string()),
        }),
        state => Err(LlmError::Upload(format!(
            "{} is {} instead of ACTIVE",
            display_name,
            state.unwrap_or("in an unknown state")
        ))),
    }
}

/// Non-2xx reply -> `LlmError::Api`, preferring the `error.message` field of
/// Google's error body over the raw text
fn api_error(status: u16, raw: String) -> LlmError {
    let message = serde_json::from_str::<ApiErrorBody>(&raw)
        .map(|body| body.error.message)
        .unwrap_or(raw);
    error!("Gemini API error {}: {}", status, message);
    LlmError::Api { status, message }
}

fn extract_text(response: GenerateContentResponse) -> Result<String, LlmError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(text)
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let body = self.build_body(request);

        info!("Sending request to Gemini model {}", self.model);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), raw));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        extract_text(parsed)
    }

    fn model(&self) -> &str {
        &self.model
    }

    /// Resumable upload to the Files API: one call to open the session, one
    /// to send the bytes and finalize
    async fn upload_file(&self, path: &Path, mime_type: &str) -> Result<UploadedFile, LlmError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| LlmError::Upload(format!("{}: {}", path.display(), e)))?;
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        info!("Uploading {} ({} bytes) to Gemini", display_name, bytes.len());

        let start = self
            .client
            .post(self.upload_endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&serde_json::json!({ "file": { "display_name": display_name } }))
            .send()
            .await?;

        let status = start.status();
        if !status.is_success() {
            let raw = start.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), raw));
        }

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|value| value.to_str().ok())
            .map(String::from)
            .ok_or_else(|| {
                LlmError::Upload(format!("no upload URL returned for {}", display_name))
            })?;

        let response = self
            .client
            .post(upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), raw));
        }

        let file = response.json::<FileEnvelope>().await?.file;
        let file = self.wait_until_processed(file).await?;
        let name = file.name.clone();

        match into_uploaded(file, &display_name, mime_type) {
            Ok(uploaded) => {
                info!("Uploaded {} as {}", display_name, uploaded.name);
                Ok(uploaded)
            }
            Err(e) => {
                // drop the unusable upload; the state error is what gets reported
                let _ = self
                    .client
                    .delete(self.file_endpoint(&name))
                    .header("x-goog-api-key", &self.api_key)
                    .send()
                    .await;
                Err(e)
            }
        }
    }

    async fn delete_file(&self, file: &UploadedFile) -> Result<(), LlmError> {
        let response = self
            .client
            .delete(self.file_endpoint(&file.name))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), raw));
        }
        debug!("Deleted {} ({})", file.name, file.display_name);
        Ok(())
    }
}
