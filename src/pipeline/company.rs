// src/pipeline/company.rs
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use super::{PipelineError, PromptRunner};
use crate::profile;
use crate::prompts::{company_culture_analyze, company_data_collect};
use crate::registry::CompanyRegistry;
use crate::scrapers::{ScrapeResult, Scraper};
use crate::store::ProfileStore;
use crate::utils::to_pretty_json;

/// URLs -> scraped pages -> raw company facts -> culture profile
pub struct CompanyPipeline {
    runner: PromptRunner,
    scraper: Arc<dyn Scraper>,
    registry: Arc<CompanyRegistry>,
    store: Option<Arc<ProfileStore>>,
}

impl CompanyPipeline {
    pub fn new(
        runner: PromptRunner,
        scraper: Arc<dyn Scraper>,
        registry: Arc<CompanyRegistry>,
        store: Option<Arc<ProfileStore>>,
    ) -> Self {
        Self {
            runner,
            scraper,
            registry,
            store,
        }
    }

    pub async fn run(&self, urls: &[String]) -> Result<Value, PipelineError> {
        if urls.is_empty() {
            return Err(PipelineError::NoUrls);
        }

        info!("Scraping {} company URLs", urls.len());
        let mut pages = self.scraper.scrape_multiple(urls).await;

        let combined: String = pages
            .iter()
            .filter(|page| page.success)
            .map(|page| page.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let matched = self.registry.match_company(&combined).map(|e| e.name.clone());
        let mut source_urls = urls.to_vec();

        match matched {
            Some(ref name) => {
                let extra: Vec<String> = self
                    .registry
                    .sources_for(name)
                    .iter()
                    .filter(|url| !urls.contains(*url))
                    .cloned()
                    .collect();
                info!(
                    "Matched company {}, scraping {} extra sources",
                    name,
                    extra.len()
                );
                if !extra.is_empty() {
                    pages.extend(self.scraper.scrape_multiple(&extra).await);
                    source_urls.extend(extra);
                }
            }
            None => info!("No registered company matched, using the given URLs only"),
        }

        let scraped_content = join_pages(&pages)?;
        info!("Collected {} chars of page text", scraped_content.chars().count());

        let collected = self
            .runner
            .run_json(
                &company_data_collect::PROMPT,
                &[("scraped_content", scraped_content.as_str())],
            )
            .await?;

        let company_data = to_pretty_json(&Value::Object(collected.clone()));
        let analyzed = self
            .runner
            .run_json(
                &company_culture_analyze::PROMPT,
                &[("company_data", company_data.as_str())],
            )
            .await?;

        let company_name = matched
            .or_else(|| profile::company_name(&Value::Object(analyzed.clone())))
            .or_else(|| profile::company_name(&Value::Object(collected)))
            .unwrap_or_else(|| profile::UNKNOWN.to_string());

        let failed_urls: Vec<&str> = pages
            .iter()
            .filter(|page| !page.success)
            .map(|page| page.url.as_str())
            .collect();

        let meta = json!({
            "company_name": company_name,
            "input_urls": urls,
            "source_urls": source_urls,
            "failed_urls": failed_urls,
            "scraper": self.scraper.name(),
        });
        let mut result = Value::Object(profile::prepend_field(analyzed, "_meta", meta));

        if let Some(ref store) = self.store {
            let id = store.save_company_profile(&result).await?;
            result["_id"] = Value::String(id);
        }

        info!("Company analysis finished for {}", company_name);
        Ok(result)
    }
}

/// `=== <url> ===` blocks of every page that scraped; failures are logged
fn join_pages(pages: &[ScrapeResult]) -> Result<String, PipelineError> {
    let mut blocks = Vec::new();
    let mut failed = Vec::new();

    for page in pages {
        if page.success {
            blocks.push(format!("=== {} ===\n{}", page.url, page.content));
        } else {
            warn!(
                "Skipping {}: {}",
                page.url,
                page.error_message.as_deref().unwrap_or("unknown error")
            );
            failed.push(page.url.clone());
        }
    }

    if blocks.is_empty() {
        return Err(PipelineError::AllScrapesFailed(failed));
    }

    Ok(blocks.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedLlm;
    use crate::pipeline::testing::schemas_dir;
    use crate::registry::CompanyEntry;
    use crate::scrapers::testing::StaticScraper;
    use tempfile::TempDir;

    fn registry() -> Arc<CompanyRegistry> {
        Arc::new(CompanyRegistry::new(vec![CompanyEntry {
            name: "토스".into(),
            keywords: vec!["toss".into()],
            sources: vec![
                "https://toss.test/culture".into(),
                "https://toss.test/jobs/1".into(),
            ],
        }]))
    }

    fn pipeline(
        llm: Arc<ScriptedLlm>,
        scraper: Arc<StaticScraper>,
        store: Option<Arc<ProfileStore>>,
    ) -> CompanyPipeline {
        CompanyPipeline::new(
            PromptRunner::new(llm, schemas_dir()),
            scraper,
            registry(),
            store,
        )
    }

    #[tokio::test]
    async fn test_matched_company_adds_registry_sources() {
        let scraper = Arc::new(StaticScraper::new(&[
            ("https://toss.test/jobs/1", "Backend engineer at Toss"),
            ("https://toss.test/culture", "We value autonomy"),
        ]));
        let llm = Arc::new(ScriptedLlm::new(vec![
            r#"{"company_meta": {"company_name": "Toss Inc"}, "facts": ["autonomy"]}"#,
            r#"{"schema_version": "company_profile.v0", "scoring_axes": {}}"#,
        ]));

        let result = pipeline(llm.clone(), scraper.clone(), None)
            .run(&["https://toss.test/jobs/1".to_string()])
            .await
            .unwrap();

        // the job URL is not scraped twice
        assert_eq!(
            *scraper.visited.lock().unwrap(),
            vec!["https://toss.test/jobs/1", "https://toss.test/culture"]
        );

        let meta = &result["_meta"];
        assert_eq!(meta["company_name"], "토스");
        assert_eq!(meta["input_urls"], json!(["https://toss.test/jobs/1"]));
        assert_eq!(
            meta["source_urls"],
            json!(["https://toss.test/jobs/1", "https://toss.test/culture"])
        );
        assert_eq!(result["schema_version"], "company_profile.v0");
        assert!(result.get("_id").is_none());

        let requests = llm.recorded();
        assert_eq!(requests.len(), 2);
        assert!(requests[0]
            .user
            .contains("=== https://toss.test/jobs/1 ===\nBackend engineer at Toss"));
        assert!(requests[0].user.contains("=== https://toss.test/culture ===\nWe value autonomy"));
        assert!(requests[1].user.contains("\"autonomy\""));
    }

    #[tokio::test]
    async fn test_unmatched_company_uses_given_urls_and_profile_name() {
        let scraper = Arc::new(StaticScraper::new(&[
            ("https://acme.test/about", "Acme builds rockets"),
        ]));
        let llm = Arc::new(ScriptedLlm::new(vec![
            r#"{"company_meta": {"company_name": "Acme"}}"#,
            r#"{"company_meta": {"company_name": "Acme Corp"}}"#,
        ]));

        let result = pipeline(llm, scraper.clone(), None)
            .run(&[
                "https://acme.test/about".to_string(),
                "https://acme.test/missing".to_string(),
            ])
            .await
            .unwrap();

        assert_eq!(scraper.visited.lock().unwrap().len(), 2);
        assert_eq!(result["_meta"]["company_name"], "Acme Corp");
        assert_eq!(result["_meta"]["failed_urls"], json!(["https://acme.test/missing"]));
    }

    #[tokio::test]
    async fn test_all_urls_failing_is_an_error() {
        let scraper = Arc::new(StaticScraper::new(&[]));
        let llm = Arc::new(ScriptedLlm::new(vec![]));

        let err = pipeline(llm.clone(), scraper, None)
            .run(&["https://down.test".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::AllScrapesFailed(ref urls) if urls.len() == 1));
        assert!(llm.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_no_urls() {
        let scraper = Arc::new(StaticScraper::new(&[]));
        let llm = Arc::new(ScriptedLlm::new(vec![]));
        let err = pipeline(llm, scraper, None).run(&[]).await.unwrap_err();
        assert!(matches!(err, PipelineError::NoUrls));
    }

    #[tokio::test]
    async fn test_persists_profile_when_store_is_set() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(
            ProfileStore::connect(&format!("sqlite://{}", dir.path().display()), "t")
                .await
                .unwrap(),
        );
        let scraper = Arc::new(StaticScraper::new(&[
            ("https://toss.test/jobs/1", "toss"),
        ]));
        let llm = Arc::new(ScriptedLlm::new(vec![r#"{"a": 1}"#, r#"{"b": 2}"#]));

        let result = pipeline(llm, scraper, Some(store.clone()))
            .run(&["https://toss.test/jobs/1".to_string()])
            .await
            .unwrap();

        let id = result["_id"].as_str().unwrap();
        let stored = store.get_company_profile("토스").await.unwrap().unwrap();
        assert_eq!(stored["_id"], id);
        assert_eq!(stored["b"], 2);
    }
}
