// src/scrapers/mod.rs
//! Page fetchers. Each backend implements `fetch`; URL checks, result
//! wrapping and multi-URL runs are shared.

use async_trait::async_trait;
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm::{LlmClient, LlmError};

pub mod browser_scraper;
pub mod http_scraper;
pub mod llm_scraper;
pub mod reader_scraper;

pub use browser_scraper::BrowserScraper;
pub use http_scraper::HttpScraper;
pub use llm_scraper::LlmScraper;
pub use reader_scraper::ReaderScraper;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Invalid URL (only http:// and https:// are supported): {0}")]
    InvalidUrl(String),

    #[error("{0} scraper is not implemented yet")]
    NotImplemented(&'static str),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error: {0}")]
    Http(u16),

    #[error("Page has no readable text")]
    Empty,

    #[error(transparent)]
    Llm(#[from] LlmError),
}

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ScrapeError::Network(format!("request timed out: {}", err))
        } else {
            ScrapeError::Network(err.to_string())
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScrapeResult {
    pub url: String,
    pub content: String,
    pub success: bool,
    pub error_message: Option<String>,
    pub metadata: serde_json::Value,
}

impl ScrapeResult {
    pub fn ok(url: &str, content: String, metadata: serde_json::Value) -> Self {
        Self {
            url: url.to_string(),
            content,
            success: true,
            error_message: None,
            metadata,
        }
    }

    pub fn failed(url: &str, error: &ScrapeError) -> Self {
        Self {
            url: url.to_string(),
            content: String::new(),
            success: false,
            error_message: Some(error.to_string()),
            metadata: serde_json::Value::Null,
        }
    }
}

pub fn validate_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[async_trait]
pub trait Scraper: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fetch the readable text of one page
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError>;

    fn metadata(&self) -> serde_json::Value {
        serde_json::json!({ "scraper": self.name() })
    }

    async fn scrape(&self, url: &str) -> ScrapeResult {
        if !validate_url(url) {
            return ScrapeResult::failed(url, &ScrapeError::InvalidUrl(url.to_string()));
        }

        info!("Scraping {} with {} scraper", url, self.name());

        match self.fetch(url).await {
            Ok(content) if content.trim().is_empty() => {
                warn!("Empty page: {}", url);
                ScrapeResult::failed(url, &ScrapeError::Empty)
            }
            Ok(content) => {
                let mut metadata = self.metadata();
                metadata["content_length"] = content.chars().count().into();
                ScrapeResult::ok(url, content, metadata)
            }
            Err(e) => {
                warn!("Failed to scrape {}: {}", url, e);
                ScrapeResult::failed(url, &e)
            }
        }
    }

    /// Sequential, results in input order
    async fn scrape_multiple(&self, urls: &[String]) -> Vec<ScrapeResult> {
        let mut results = Vec::with_capacity(urls.len());
        for url in urls {
            results.push(self.scrape(url).await);
        }
        results
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScraperKind {
    Llm,
    Http,
    Reader,
    Browser,
}

impl ScraperKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScraperKind::Llm => "llm",
            ScraperKind::Http => "http",
            ScraperKind::Reader => "reader",
            ScraperKind::Browser => "browser",
        }
    }
}

impl FromStr for ScraperKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "llm" | "gemini" => Ok(ScraperKind::Llm),
            "http" => Ok(ScraperKind::Http),
            "reader" | "jina" => Ok(ScraperKind::Reader),
            "browser" => Ok(ScraperKind::Browser),
            other => anyhow::bail!(
                "Unknown scraper '{}'. Use llm, http, reader or browser",
                other
            ),
        }
    }
}

pub fn build_scraper(
    kind: ScraperKind,
    llm: Arc<dyn LlmClient>,
    reader_api_key: Option<String>,
) -> anyhow::Result<Arc<dyn Scraper>> {
    let scraper: Arc<dyn Scraper> = match kind {
        ScraperKind::Llm => Arc::new(LlmScraper::new(llm)),
        ScraperKind::Http => Arc::new(HttpScraper::new()?),
        ScraperKind::Reader => Arc::new(ReaderScraper::new(reader_api_key)?),
        ScraperKind::Browser => Arc::new(BrowserScraper::new()),
    };
    Ok(scraper)
}
