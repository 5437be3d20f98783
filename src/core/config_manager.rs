// src/core/config_manager.rs
//! Unified configuration management - every setting comes from the environment

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

use crate::scrapers::ScraperKind;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_DATABASE_URI: &str = "sqlite://data";
const DEFAULT_DATABASE_NAME: &str = "culturefit";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub llm: LlmConfig,
    pub database: DatabaseConfig,
    pub paths: PathsConfig,
    pub scraper: ScraperConfig,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub uri: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct PathsConfig {
    pub schemas_dir: PathBuf,
    pub companies_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub kind: ScraperKind,
    pub reader_api_key: Option<String>,
}

/// Outcome of `ConfigManager::validate`, printed by the `config` command.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub config: serde_json::Value,
}

impl ConfigManager {
    /// Load configuration from the process environment. `main` has already
    /// merged `.env` into it.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let temperature = match get("LLM_TEMPERATURE") {
            Some(raw) => raw
                .parse::<f32>()
                .with_context(|| format!("LLM_TEMPERATURE must be a number, got '{}'", raw))?,
            None => 0.0,
        };

        let timeout_seconds = match get("LLM_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("LLM_TIMEOUT_SECS must be an integer, got '{}'", raw))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let kind = match get("CULTUREFIT_SCRAPER") {
            Some(raw) => raw.parse::<ScraperKind>()?,
            None => ScraperKind::Llm,
        };

        Ok(Self {
            llm: LlmConfig {
                api_key: get("GOOGLE_API_KEY"),
                model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                api_url: get("GEMINI_API_URL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string()),
                temperature,
                timeout_seconds,
            },
            database: DatabaseConfig {
                uri: get("DATABASE_URI").unwrap_or_else(|| DEFAULT_DATABASE_URI.to_string()),
                name: get("DATABASE_NAME").unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string()),
            },
            paths: PathsConfig {
                schemas_dir: get("CULTUREFIT_SCHEMAS_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("schemas")),
                companies_file: get("CULTUREFIT_COMPANIES")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("config/companies.yaml")),
            },
            scraper: ScraperConfig {
                kind,
                reader_api_key: get("JINA_API_KEY"),
            },
        })
    }

    /// API key or a descriptive error for commands that must call the LLM
    pub fn require_api_key(&self) -> Result<&str> {
        self.llm
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("GOOGLE_API_KEY is not set"))
    }

    /// Check the configuration without touching the network
    pub fn validate(&self) -> ConfigReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if self.llm.api_key.is_none() {
            errors.push("GOOGLE_API_KEY is not set.".to_string());
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            errors.push(format!(
                "LLM_TEMPERATURE must be within 0.0..=2.0, got {}",
                self.llm.temperature
            ));
        }
        if !self.paths.schemas_dir.is_dir() {
            warnings.push(format!(
                "Schemas directory not found: {}",
                self.paths.schemas_dir.display()
            ));
        }
        if !self.paths.companies_file.is_file() {
            warnings.push(format!(
                "Company registry not found: {} (built-in registry will be used)",
                self.paths.companies_file.display()
            ));
        }
        if self.scraper.kind == ScraperKind::Browser {
            warnings.push("Browser scraper is not implemented yet; company runs will fail.".to_string());
        }

        ConfigReport {
            valid: errors.is_empty(),
            errors,
            warnings,
            config: serde_json::json!({
                "google_api_key": if self.llm.api_key.is_some() { "***" } else { "NOT SET" },
                "gemini_model": self.llm.model,
                "gemini_api_url": self.llm.api_url,
                "llm_temperature": self.llm.temperature,
                "database_uri": self.database.uri,
                "database_name": self.database.name,
                "schemas_dir": self.paths.schemas_dir.display().to_string(),
                "companies_file": self.paths.companies_file.display().to_string(),
                "scraper": self.scraper.kind.as_str(),
                "jina_api_key": if self.scraper.reader_api_key.is_some() { "***" } else { "NOT SET" },
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ConfigManager> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ConfigManager::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_load_reads_only_the_process_environment() {
        let loaded = ConfigManager::load().unwrap();
        let direct = ConfigManager::from_lookup(|key| std::env::var(key).ok()).unwrap();
        assert_eq!(format!("{:?}", loaded), format!("{:?}", direct));
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.llm.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.database.uri, "sqlite://data");
        assert_eq!(config.database.name, "culturefit");
        assert_eq!(config.scraper.kind, ScraperKind::Llm);
        assert!(config.require_api_key().is_err());
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        let report = config_from(&[]).unwrap().validate();
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.contains("GOOGLE_API_KEY")));
        assert_eq!(report.config["google_api_key"], "NOT SET");
    }

    #[test]
    fn test_api_key_is_masked() {
        let report = config_from(&[("GOOGLE_API_KEY", "secret-value")])
            .unwrap()
            .validate();
        assert!(report.valid);
        assert_eq!(report.config["google_api_key"], "***");
        assert!(!report.config.to_string().contains("secret-value"));
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = config_from(&[("GEMINI_MODEL", "  "), ("DATABASE_NAME", "")]).unwrap();
        assert_eq!(config.llm.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.database.name, "culturefit");
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        assert!(config_from(&[("LLM_TEMPERATURE", "warm")]).is_err());
        assert!(config_from(&[("LLM_TIMEOUT_SECS", "-1")]).is_err());
        assert!(config_from(&[("CULTUREFIT_SCRAPER", "selenium")]).is_err());
    }

    #[test]
    fn test_missing_paths_are_warnings() {
        let report = config_from(&[
            ("GOOGLE_API_KEY", "k"),
            ("CULTUREFIT_SCHEMAS_DIR", "/no/such/schemas"),
            ("CULTUREFIT_COMPANIES", "/no/such/companies.yaml"),
        ])
        .unwrap()
        .validate();
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 2);
    }
}
