// src/core/fs_ops.rs
//! File system helpers shared by the schema loader and the document store

use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;
use tracing::info;

pub struct FsOps;

impl FsOps {
    /// Ensure directory exists
    pub async fn ensure_dir_exists(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)
                .await
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
            info!("Created directory: {}", path.display());
        }
        Ok(())
    }

    /// File names in `dir` with the given extension, sorted.
    /// A missing directory yields an empty list.
    pub fn list_files_with_extension(dir: &Path, extension: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();

        if !dir.is_dir() {
            return Ok(names);
        }

        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

        for entry in entries {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();
            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case(extension))
                .unwrap_or(false);

            if path.is_file() && matches {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_files_with_extension() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.json"), "{}").unwrap();
        std::fs::write(dir.path().join("a.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("nested.json")).unwrap();

        let names = FsOps::list_files_with_extension(dir.path(), "json").unwrap();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let names = FsOps::list_files_with_extension(Path::new("/no/such/dir"), "json").unwrap();
        assert!(names.is_empty());
    }

    #[tokio::test]
    async fn test_ensure_dir_exists_creates_nested() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        FsOps::ensure_dir_exists(&nested).await.unwrap();
        assert!(nested.is_dir());
    }
}
