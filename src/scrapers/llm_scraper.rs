// src/scrapers/llm_scraper.rs
use async_trait::async_trait;
use std::sync::Arc;

use super::{ScrapeError, Scraper};
use crate::llm::{CompletionRequest, LlmClient};

const SCRAPE_PROMPT: &str = "Open the web page at the URL below and return its main text content.
Keep anything about the company, the job, hiring, values and culture.
Drop navigation, cookie banners and footers. Reply with plain text only.

URL: {url}";

/// Lets the model fetch the page itself
pub struct LlmScraper {
    llm: Arc<dyn LlmClient>,
}

impl LlmScraper {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Scraper for LlmScraper {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let request = CompletionRequest::new(SCRAPE_PROMPT.replace("{url}", url))
            .with_url_context()
            .temperature(0.0);
        Ok(self.llm.complete(request).await?)
    }

    fn metadata(&self) -> serde_json::Value {
        serde_json::json!({ "scraper": self.name(), "model": self.llm.model() })
    }
}
