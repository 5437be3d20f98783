// src/registry.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

const BUILTIN_REGISTRY: &str = include_str!("../config/companies.yaml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyEntry {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Known companies with the extra culture pages scraped for them
#[derive(Debug, Clone, Default)]
pub struct CompanyRegistry {
    entries: Vec<CompanyEntry>,
}

impl CompanyRegistry {
    pub fn new(entries: Vec<CompanyEntry>) -> Self {
        Self { entries }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let entries: Vec<CompanyEntry> =
            serde_yaml::from_str(content).context("Failed to parse company registry")?;
        Ok(Self::new(entries))
    }

    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_REGISTRY)
    }

    /// Load the registry file, falling back to the built-in list when it is missing
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            warn!(
                "Company registry {} not found, using built-in registry",
                path.display()
            );
            return Self::builtin();
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read company registry: {}", path.display()))?;
        let registry = Self::from_yaml(&content)?;
        info!(
            "Loaded {} companies from {}",
            registry.entries.len(),
            path.display()
        );
        Ok(registry)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// First company whose keyword appears in `text` (case-insensitive)
    pub fn match_company(&self, text: &str) -> Option<&CompanyEntry> {
        let haystack = text.to_lowercase();
        self.entries.iter().find(|entry| {
            entry
                .keywords
                .iter()
                .any(|keyword| !keyword.is_empty() && haystack.contains(&keyword.to_lowercase()))
        })
    }

    pub fn sources_for(&self, company_name: &str) -> &[String] {
        self.entries
            .iter()
            .find(|e| e.name == company_name)
            .map(|e| e.sources.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_parses() {
        let registry = CompanyRegistry::builtin().unwrap();
        assert_eq!(registry.names(), vec!["현대오토에버", "업스테이지", "토스"]);
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let registry = CompanyRegistry::builtin().unwrap();
        let entry = registry
            .match_company("Join the UPSTAGE research team")
            .unwrap();
        assert_eq!(entry.name, "업스테이지");
        assert_eq!(registry.sources_for(&entry.name).len(), 2);
    }

    #[test]
    fn test_first_entry_wins() {
        let registry = CompanyRegistry::new(vec![
            CompanyEntry {
                name: "A".into(),
                keywords: vec!["shared".into()],
                sources: vec![],
            },
            CompanyEntry {
                name: "B".into(),
                keywords: vec!["shared".into()],
                sources: vec![],
            },
        ]);
        assert_eq!(registry.match_company("a shared phrase").unwrap().name, "A");
    }

    #[test]
    fn test_no_match_and_unknown_sources() {
        let registry = CompanyRegistry::builtin().unwrap();
        assert!(registry.match_company("a bakery in Lyon").is_none());
        assert!(registry.sources_for("Unknown Corp").is_empty());
    }

    #[test]
    fn test_missing_file_falls_back_to_builtin() {
        let registry = CompanyRegistry::load(Path::new("/no/such/companies.yaml")).unwrap();
        assert_eq!(registry.names().len(), 3);
    }
}
