// src/scrapers/http_scraper.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;

use super::{ScrapeError, Scraper};
use crate::utils::clean_text;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Elements whose text never reaches the LLM
const SKIPPED_ELEMENTS: &[&str] = &[
    "head", "script", "style", "noscript", "iframe", "svg", "nav", "header", "footer",
];

/// Plain GET + HTML-to-text. Fine for server-rendered pages only.
pub struct HttpScraper {
    client: Client,
}

impl HttpScraper {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

/// Visible text of an HTML document, one text node per line
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut text = String::new();

    for node in document.root_element().descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map(|element| SKIPPED_ELEMENTS.iter().any(|name| *name == element.name()))
                .unwrap_or(false)
        });

        if !hidden {
            text.push_str(fragment);
            text.push('\n');
        }
    }

    clean_text(&text)
}

#[async_trait]
impl Scraper for HttpScraper {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ScrapeError::Http(response.status().as_u16()));
        }

        let html = response.text().await?;
        Ok(html_to_text(&html))
    }
}
