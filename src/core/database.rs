// src/core/database.rs
//! SQLite-backed document store: JSON bodies grouped by collection and
//! looked up by entity name.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::FsOps;

// ===== Core Database Connection Management =====

pub struct Database {
    pool: SqlitePool,
}

/// Map a database URI and name to the SQLite file:
/// `sqlite://data` + `culturefit` -> `data/culturefit.db`.
/// A URI that already names a `.db` file is used as-is.
pub fn database_path(uri: &str, name: &str) -> Result<PathBuf> {
    let location = uri
        .strip_prefix("sqlite://")
        .or_else(|| uri.strip_prefix("sqlite:"))
        .unwrap_or(uri)
        .split('?')
        .next()
        .unwrap_or_default();

    if location.ends_with(".db") {
        return Ok(PathBuf::from(location));
    }

    let name = name.trim();
    if name.is_empty() || name.contains('/') || name.contains('\\') || name == ".." {
        anyhow::bail!("Invalid database name: '{}'", name);
    }

    let dir = if location.is_empty() { "." } else { location };
    Ok(Path::new(dir).join(format!("{}.db", name)))
}

impl Database {
    pub async fn connect(uri: &str, name: &str) -> Result<Self> {
        let path = database_path(uri, name)?;
        Self::new(&path).await
    }

    /// Create new database connection with automatic setup
    pub async fn new(database_path: &Path) -> Result<Self> {
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                FsOps::ensure_dir_exists(parent).await?;
            }
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path.display());
        let pool = SqlitePool::connect(&database_url).await.with_context(|| {
            format!("Failed to connect to database: {}", database_path.display())
        })?;

        info!(
            "Database connection established: {}",
            database_path.display()
        );

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                name TEXT NOT NULL,
                related_name TEXT,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_collection_name ON documents(collection, name);",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_collection_related ON documents(collection, related_name);",
        )
        .execute(&self.pool)
        .await?;

        info!("Database migrations completed");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database health check failed")?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

// ===== Document Models =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Companies,
    Applicants,
    Comparisons,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Companies => "company_profiles",
            Collection::Applicants => "applicant_profiles",
            Collection::Comparisons => "culture_comparisons",
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredDocument {
    pub id: String,
    pub collection: String,
    pub name: String,
    pub related_name: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredDocument {
    /// Parsed body with the row id attached as `_id`
    pub fn into_value(self) -> Result<Value> {
        let mut value: Value = serde_json::from_str(&self.body)
            .with_context(|| format!("Stored document {} is not valid JSON", self.id))?;
        if let Value::Object(ref mut map) = value {
            map.insert("_id".to_string(), Value::String(self.id));
        }
        Ok(value)
    }
}

// ===== Document Repository =====

pub struct DocumentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> DocumentRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a document and return its id. `created_at` / `updated_at` are
    /// stamped into `body`; an incoming `_id` is dropped.
    pub async fn insert(
        &self,
        collection: Collection,
        name: &str,
        related_name: Option<&str>,
        body: &mut Map<String, Value>,
    ) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        body.remove("_id");
        body.insert("created_at".to_string(), Value::String(now.to_rfc3339()));
        body.insert("updated_at".to_string(), Value::String(now.to_rfc3339()));

        let serialized =
            serde_json::to_string(body).context("Failed to serialize document body")?;

        sqlx::query(
            r#"
            INSERT INTO documents (id, collection, name, related_name, body, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(collection.name())
        .bind(name)
        .bind(related_name)
        .bind(serialized)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await
        .with_context(|| format!("Failed to insert into {}", collection.name()))?;

        info!("Stored {} document {} ({})", collection.name(), id, name);
        Ok(id)
    }

    /// Most recent document with exactly this name
    pub async fn latest_by_name(
        &self,
        collection: Collection,
        name: &str,
    ) -> Result<Option<StoredDocument>> {
        let document = sqlx::query_as::<_, StoredDocument>(
            r#"
            SELECT id, collection, name, related_name, body, created_at, updated_at
            FROM documents
            WHERE collection = ? AND name = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT 1
            "#,
        )
        .bind(collection.name())
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        Ok(document)
    }

    /// Case-insensitive substring match on the name
    pub async fn search_by_name(
        &self,
        collection: Collection,
        fragment: &str,
    ) -> Result<Vec<StoredDocument>> {
        let documents = sqlx::query_as::<_, StoredDocument>(
            r#"
            SELECT id, collection, name, related_name, body, created_at, updated_at
            FROM documents
            WHERE collection = ? AND instr(lower(name), lower(?)) > 0
            ORDER BY name ASC, created_at DESC
            "#,
        )
        .bind(collection.name())
        .bind(fragment)
        .fetch_all(self.pool)
        .await?;

        Ok(documents)
    }

    pub async fn list_by_name(
        &self,
        collection: Collection,
        name: &str,
    ) -> Result<Vec<StoredDocument>> {
        let documents = sqlx::query_as::<_, StoredDocument>(
            r#"
            SELECT id, collection, name, related_name, body, created_at, updated_at
            FROM documents
            WHERE collection = ? AND name = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(collection.name())
        .bind(name)
        .fetch_all(self.pool)
        .await?;

        Ok(documents)
    }

    pub async fn list_by_related_name(
        &self,
        collection: Collection,
        related_name: &str,
    ) -> Result<Vec<StoredDocument>> {
        let documents = sqlx::query_as::<_, StoredDocument>(
            r#"
            SELECT id, collection, name, related_name, body, created_at, updated_at
            FROM documents
            WHERE collection = ? AND related_name = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(collection.name())
        .bind(related_name)
        .fetch_all(self.pool)
        .await?;

        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_database_path() {
        assert_eq!(
            database_path("sqlite://data", "culturefit").unwrap(),
            PathBuf::from("data/culturefit.db")
        );
        assert_eq!(
            database_path("sqlite:/var/lib/fit?mode=rwc", "prod").unwrap(),
            PathBuf::from("/var/lib/fit/prod.db")
        );
        assert_eq!(
            database_path("store", "x").unwrap(),
            PathBuf::from("store/x.db")
        );
        assert_eq!(
            database_path("sqlite://", "x").unwrap(),
            PathBuf::from("./x.db")
        );
        assert_eq!(
            database_path("sqlite://tmp/explicit.db", "ignored").unwrap(),
            PathBuf::from("tmp/explicit.db")
        );
        assert!(database_path("sqlite://data", "../escape").is_err());
        assert!(database_path("sqlite://data", " ").is_err());
    }

    #[tokio::test]
    async fn test_insert_and_latest_by_name() {
        let dir = TempDir::new().unwrap();
        let db = Database::new(&dir.path().join("nested").join("t.db"))
            .await
            .unwrap();
        db.health_check().await.unwrap();
        let repo = DocumentRepository::new(db.pool());

        let mut first = serde_json::json!({ "v": 1, "_id": "stale" })
            .as_object()
            .cloned()
            .unwrap();
        let first_id = repo
            .insert(Collection::Companies, "토스", None, &mut first)
            .await
            .unwrap();
        assert!(first.contains_key("created_at"));
        assert!(!first.contains_key("_id"));

        let mut second = serde_json::json!({ "v": 2 }).as_object().cloned().unwrap();
        let second_id = repo
            .insert(Collection::Companies, "토스", None, &mut second)
            .await
            .unwrap();
        assert_ne!(first_id, second_id);

        let latest = repo
            .latest_by_name(Collection::Companies, "토스")
            .await
            .unwrap()
            .unwrap()
            .into_value()
            .unwrap();
        assert_eq!(latest["v"], 2);
        assert_eq!(latest["_id"], second_id.as_str());

        // other collections are isolated
        assert!(repo
            .latest_by_name(Collection::Applicants, "토스")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_search_and_related() {
        let dir = TempDir::new().unwrap();
        let db = Database::new(&dir.path().join("t.db")).await.unwrap();
        let repo = DocumentRepository::new(db.pool());

        for (name, related) in [("Upstage", "Kim"), ("Upstage AI", "Lee"), ("Toss", "Kim")] {
            let mut body = Map::new();
            repo.insert(Collection::Comparisons, name, Some(related), &mut body)
                .await
                .unwrap();
        }

        let found = repo
            .search_by_name(Collection::Comparisons, "upstage")
            .await
            .unwrap();
        let names: Vec<_> = found.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Upstage", "Upstage AI"]);

        let kim = repo
            .list_by_related_name(Collection::Comparisons, "Kim")
            .await
            .unwrap();
        assert_eq!(kim.len(), 2);

        let toss = repo
            .list_by_name(Collection::Comparisons, "Toss")
            .await
            .unwrap();
        assert_eq!(toss.len(), 1);
        assert_eq!(toss[0].related_name.as_deref(), Some("Kim"));
        db.close().await;
    }
}
