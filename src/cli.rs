// src/cli.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::config_manager::DatabaseConfig;
use crate::core::database::database_path;
use crate::core::ConfigManager;
use crate::llm::{GeminiClient, LlmClient};
use crate::pipeline::{
    run_full_analysis, ApplicantPipeline, CompanyPipeline, ComparePipeline, PromptRunner,
};
use crate::registry::CompanyRegistry;
use crate::schema::list_available_schemas;
use crate::scrapers::build_scraper;
use crate::store::ProfileStore;
use crate::utils::{read_file_content, to_pretty_json};

#[derive(Parser, Debug)]
#[command(name = "culture-fit")]
#[command(about = "Extract company and applicant culture profiles and score how well they match")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate the configuration and show the effective settings. An
    /// existing document store is health-checked; a missing one is not created.
    Config,
    /// List the JSON schema files the prompts use
    Schemas,
    /// Scrape company pages and build a culture profile
    Company {
        /// Job posting or company pages
        #[arg(long, num_args = 1.., required = true)]
        urls: Vec<String>,
        /// Do not save the profile
        #[arg(long)]
        no_db: bool,
    },
    /// Build an applicant profile from a resume or portfolio
    Applicant {
        /// Text or markdown file to read
        #[arg(
            long,
            conflicts_with_all = ["text", "pdf"],
            required_unless_present_any = ["text", "pdf"]
        )]
        file: Option<PathBuf>,
        /// Resume text given inline
        #[arg(long, conflicts_with = "pdf")]
        text: Option<String>,
        /// Resume, portfolio or essay PDFs, analyzed together
        #[arg(long, num_args = 1..)]
        pdf: Vec<PathBuf>,
        /// Candidate name, overriding the extracted one
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        no_db: bool,
    },
    /// Compare stored company and applicant profiles
    Compare {
        #[arg(long)]
        company: String,
        #[arg(long)]
        applicant: String,
        /// Do not save the comparison
        #[arg(long)]
        no_db: bool,
    },
    /// Company and applicant analysis side by side, then the comparison
    Analyze {
        #[arg(long, num_args = 1.., required = true)]
        urls: Vec<String>,
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        no_db: bool,
    },
}

/// Everything a pipeline command needs, built once from the configuration
struct Services {
    config: ConfigManager,
    runner: PromptRunner,
    store: Option<Arc<ProfileStore>>,
}

impl Services {
    async fn build(config: ConfigManager, with_store: bool) -> Result<Self> {
        config.require_api_key()?;

        let llm: Arc<dyn LlmClient> = Arc::new(GeminiClient::from_config(&config.llm)?);
        info!("Using model {}", llm.model());
        let runner = PromptRunner::new(llm, config.paths.schemas_dir.clone());

        let store = if with_store {
            let store = ProfileStore::connect(&config.database.uri, &config.database.name)
                .await
                .context("Failed to open the document store")?;
            Some(Arc::new(store))
        } else {
            info!("Document store disabled");
            None
        };

        Ok(Self {
            config,
            runner,
            store,
        })
    }

    fn company_pipeline(&self) -> Result<CompanyPipeline> {
        let scraper = build_scraper(
            self.config.scraper.kind,
            self.runner.llm().clone(),
            self.config.scraper.reader_api_key.clone(),
        )?;
        let registry = CompanyRegistry::load(&self.config.paths.companies_file)?;

        Ok(CompanyPipeline::new(
            self.runner.clone(),
            scraper,
            Arc::new(registry),
            self.store.clone(),
        ))
    }

    fn applicant_pipeline(&self) -> ApplicantPipeline {
        ApplicantPipeline::new(self.runner.clone(), self.store.clone())
    }

    fn compare_pipeline(&self) -> ComparePipeline {
        ComparePipeline::new(self.runner.clone(), self.store.clone())
    }

    async fn close(&self) {
        if let Some(ref store) = self.store {
            store.close().await;
        }
    }
}

pub async fn handle_command(cli: Cli) -> Result<()> {
    let config = ConfigManager::load()?;

    match cli.command {
        Command::Config => {
            let mut report = config.validate();
            report.warnings.extend(store_warnings(&config.database).await);

            println!("{}", to_pretty_json(&serde_json::to_value(&report)?));
            if !report.valid {
                anyhow::bail!("Configuration is invalid: {}", report.errors.join("; "));
            }
        }

        Command::Schemas => {
            let schemas = list_available_schemas(&config.paths.schemas_dir)?;
            if schemas.is_empty() {
                warn!(
                    "No schema files found in {}",
                    config.paths.schemas_dir.display()
                );
            }
            println!(
                "{}",
                to_pretty_json(&json!({
                    "schemas_dir": config.paths.schemas_dir.display().to_string(),
                    "schemas": schemas,
                }))
            );
        }

        Command::Company { urls, no_db } => {
            let services = Services::build(config, !no_db).await?;
            let result = services.company_pipeline()?.run(&urls).await;
            services.close().await;
            println!("{}", to_pretty_json(&result?));
        }

        Command::Applicant {
            file,
            text,
            pdf,
            name,
            no_db,
        } => {
            let services = Services::build(config, !no_db).await?;
            let pipeline = services.applicant_pipeline();
            let result = match (file, text) {
                _ if !pdf.is_empty() => pipeline.run_from_pdfs(&pdf, name.as_deref()).await,
                (Some(path), _) => pipeline.run_from_file(&path, name.as_deref()).await,
                (None, Some(text)) => pipeline.run(&text, name.as_deref()).await,
                (None, None) => anyhow::bail!("One of --file, --text or --pdf is required"),
            };
            services.close().await;
            println!("{}", to_pretty_json(&result?));
        }

        Command::Compare {
            company,
            applicant,
            no_db,
        } => {
            // profiles always come from the store; --no-db only skips saving
            let services = Services::build(config, true).await?;
            let mut pipeline = services.compare_pipeline();
            if no_db {
                pipeline = pipeline.read_only();
            }
            let result = pipeline.run_from_db(&company, &applicant).await;
            services.close().await;
            println!("{}", to_pretty_json(&result?));
        }

        Command::Analyze { urls, file, no_db } => {
            let resume_text = read_file_content(&file).await?;
            let services = Services::build(config, !no_db).await?;
            let result = run_full_analysis(
                &services.company_pipeline()?,
                &services.applicant_pipeline(),
                &services.compare_pipeline(),
                &urls,
                &resume_text,
            )
            .await;
            services.close().await;
            println!("{}", to_pretty_json(&result?));
        }
    }

    Ok(())
}

/// Health-check the document store when its file exists; never create it
async fn store_warnings(database: &DatabaseConfig) -> Vec<String> {
    let path = match database_path(&database.uri, &database.name) {
        Ok(path) => path,
        Err(e) => return vec![format!("Document store unavailable: {:#}", e)],
    };

    if !path.exists() {
        return vec![format!(
            "Document store {} does not exist yet; it is created on the first save",
            path.display()
        )];
    }

    match ProfileStore::connect(&database.uri, &database.name).await {
        Ok(store) => {
            let result = store.health_check().await;
            store.close().await;
            match result {
                Ok(()) => Vec::new(),
                Err(e) => vec![format!("Document store health check failed: {}", e)],
            }
        }
        Err(e) => vec![format!("Document store unavailable: {:#}", e)],
    }
}
