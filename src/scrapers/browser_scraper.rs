// src/scrapers/browser_scraper.rs
use async_trait::async_trait;

use super::{ScrapeError, Scraper};

/// Placeholder for a headless-browser backend (JS-rendered pages).
/// Every fetch fails until one is wired in.
#[derive(Debug, Default)]
pub struct BrowserScraper;

impl BrowserScraper {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Scraper for BrowserScraper {
    fn name(&self) -> &'static str {
        "browser"
    }

    async fn fetch(&self, _url: &str) -> Result<String, ScrapeError> {
        Err(ScrapeError::NotImplemented("browser"))
    }
}
