// src/schema.rs
//! JSON schema files the LLM is asked to honor. They are read from disk on
//! every call so prompt authors can edit them without a rebuild.

use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::FsOps;

pub const APPLICANT_SCHEMA: &str = "applicant_schema";
pub const COMPANY_SCHEMA: &str = "company_schema";
pub const MATCHING_SCHEMA: &str = "matching_schema";

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Schema file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read schema {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON in schema {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Path of a schema file; `.json` is appended when missing
pub fn schema_path(schemas_dir: &Path, schema_name: &str) -> PathBuf {
    if schema_name.ends_with(".json") {
        schemas_dir.join(schema_name)
    } else {
        schemas_dir.join(format!("{}.json", schema_name))
    }
}

pub fn load_schema(schemas_dir: &Path, schema_name: &str) -> Result<Value, SchemaError> {
    let path = schema_path(schemas_dir, schema_name);

    if !path.is_file() {
        return Err(SchemaError::NotFound(path));
    }

    let content = std::fs::read_to_string(&path).map_err(|source| SchemaError::Io {
        path: path.clone(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| SchemaError::Parse { path, source })
}

pub fn schema_to_string(schema: &Value) -> String {
    serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string())
}

/// Schema text ready to be injected into a prompt
pub fn schema_for_prompt(schemas_dir: &Path, schema_name: &str) -> Result<String, SchemaError> {
    load_schema(schemas_dir, schema_name).map(|schema| schema_to_string(&schema))
}

pub fn list_available_schemas(schemas_dir: &Path) -> anyhow::Result<Vec<String>> {
    FsOps::list_files_with_extension(schemas_dir, "json")
}
