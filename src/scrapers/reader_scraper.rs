// src/scrapers/reader_scraper.rs
//! Reader-proxy backend: `GET https://r.jina.ai/<url>` returns the page,
//! JS-rendered, as markdown.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{ScrapeError, ScrapeResult, Scraper};

const READER_URL: &str = "https://r.jina.ai/";
const PAUSE_BETWEEN_URLS: Duration = Duration::from_secs(1);

pub struct ReaderScraper {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ReaderScraper {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_base_url(READER_URL, api_key)
    }

    pub fn with_base_url(base_url: &str, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn reader_url(&self, url: &str) -> String {
        format!("{}{}", self.base_url, url)
    }
}

#[async_trait]
impl Scraper for ReaderScraper {
    fn name(&self) -> &'static str {
        "reader"
    }

    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let mut request = self.client.get(self.reader_url(url));
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ScrapeError::Http(response.status().as_u16()));
        }

        Ok(response.text().await?)
    }

    // the free tier rate-limits bursts
    async fn scrape_multiple(&self, urls: &[String]) -> Vec<ScrapeResult> {
        let mut results = Vec::with_capacity(urls.len());
        for (i, url) in urls.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(PAUSE_BETWEEN_URLS).await;
            }
            results.push(self.scrape(url).await);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_url() {
        let scraper = ReaderScraper::with_base_url("http://reader.local", None).unwrap();
        assert_eq!(
            scraper.reader_url("https://toss.im/career/culture"),
            "http://reader.local/https://toss.im/career/culture"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_urls_skip_network() {
        let scraper = ReaderScraper::new(None).unwrap();
        let results = scraper
            .scrape_multiple(&["mailto:a@b.c".to_string(), "not a url".to_string()])
            .await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| !r.success));
    }
}
