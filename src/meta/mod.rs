//! Metadata storage using SQLite
//!
//! This module handles all local metadata storage including:
//! - Content items (ingested pages and pasted documents)
//! - Chunks (embedded text chunks)
//! - Crawl runs (history and stats)

mod schema;

pub use schema::*;

use crate::config::Config;
use crate::error::{Error, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

/// Content item types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    WebPage,
    TextDocument,
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentType::WebPage => write!(f, "web_page"),
            ContentType::TextDocument => write!(f, "text_document"),
        }
    }
}

impl FromStr for ContentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "web_page" => Ok(ContentType::WebPage),
            "text_document" => Ok(ContentType::TextDocument),
            _ => Err(Error::Config(format!("Unknown content type: {}", s))),
        }
    }
}

/// Crawl run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for RunStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed),
            _ => Err(Error::Config(format!("Unknown run status: {}", s))),
        }
    }
}

/// Derive a stable item ID from the content source: the URL for fetched
/// pages, the leading text for pasted documents. Re-ingesting the same
/// source always maps to the same row.
pub fn stable_item_id(url: Option<&str>, text: &str) -> String {
    let key = match url {
        Some(u) => u.as_bytes(),
        None => {
            let end = text.char_indices().nth(512).map_or(text.len(), |(i, _)| i);
            text[..end].as_bytes()
        }
    };
    blake3::hash(key).to_hex()[..32].to_string()
}

/// An ingested content item
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub url: Option<String>,
    pub title: String,
    pub summary: Option<String>,
    pub content_type: String,
    pub word_count: i64,
    pub content_hash: String,
    pub fetched_at: String,
    pub updated_at: String,
}

impl ContentItem {
    pub fn new(
        id: String,
        url: Option<String>,
        title: String,
        content_type: ContentType,
        word_count: usize,
        content_hash: String,
    ) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id,
            url,
            title,
            summary: None,
            content_type: content_type.to_string(),
            word_count: word_count as i64,
            content_hash,
            fetched_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn get_type(&self) -> Result<ContentType> {
        self.content_type.parse()
    }
}

/// A text chunk
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub item_id: String,
    pub chunk_index: i32,
    pub chunk_hash: String,
    pub chunk_text: String,
    pub char_start: i32,
    pub char_end: i32,
    pub point_id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Chunk {
    pub fn new(
        item_id: String,
        chunk_index: i32,
        chunk_hash: String,
        chunk_text: String,
        char_start: i32,
        char_end: i32,
    ) -> Self {
        let now = Utc::now().to_rfc3339();
        // Use chunk_hash to derive stable Qdrant point ID
        let point_id = Uuid::new_v5(&Uuid::NAMESPACE_OID, chunk_hash.as_bytes()).to_string();

        Self {
            id: Uuid::new_v4().to_string(),
            item_id,
            chunk_index,
            chunk_hash,
            chunk_text,
            char_start,
            char_end,
            point_id,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// A crawl run record
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CrawlRun {
    pub id: String,
    pub seed_url: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub status: String,
    pub pages_fetched: i32,
    pub pages_failed: i32,
    pub errors_json: Option<String>,
}

impl CrawlRun {
    pub fn new(seed_url: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            seed_url,
            started_at: Utc::now().to_rfc3339(),
            completed_at: None,
            status: RunStatus::Running.to_string(),
            pages_fetched: 0,
            pages_failed: 0,
            errors_json: None,
        }
    }
}

/// Metadata database handle
#[derive(Clone)]
pub struct MetaDb {
    pool: SqlitePool,
}

impl MetaDb {
    /// Connect to the metadata database
    pub async fn connect(config: &Config) -> Result<Self> {
        Self::new(&config.paths.db_file).await
    }

    /// Open the database at a path, initializing the schema if needed
    pub async fn new(db_path: &std::path::Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        debug!("Connecting to SQLite database at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };

        if !db.is_initialized().await? {
            db.init_schema().await?;
        }

        Ok(db)
    }

    /// Initialize the database schema
    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing database schema");
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Check if database is initialized
    pub async fn is_initialized(&self) -> Result<bool> {
        let result: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='content_items'",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(result.is_some())
    }

    // ===== Content Item Operations =====

    /// Insert or update a content item. The first fetched_at is preserved
    /// on re-ingestion; only the mutable columns are updated.
    pub async fn upsert_item(&self, item: &ContentItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO content_items (id, url, title, summary, content_type, word_count, content_hash, fetched_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                summary = excluded.summary,
                word_count = excluded.word_count,
                content_hash = excluded.content_hash,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&item.id)
        .bind(&item.url)
        .bind(&item.title)
        .bind(&item.summary)
        .bind(&item.content_type)
        .bind(item.word_count)
        .bind(&item.content_hash)
        .bind(&item.fetched_at)
        .bind(&item.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get item by ID
    pub async fn get_item(&self, id: &str) -> Result<Option<ContentItem>> {
        let item = sqlx::query_as::<_, ContentItem>("SELECT * FROM content_items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    /// Get item by URL
    pub async fn get_item_by_url(&self, url: &str) -> Result<Option<ContentItem>> {
        let item = sqlx::query_as::<_, ContentItem>("SELECT * FROM content_items WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    /// List all items, newest first
    pub async fn list_items(&self) -> Result<Vec<ContentItem>> {
        let items = sqlx::query_as::<_, ContentItem>(
            "SELECT * FROM content_items ORDER BY fetched_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// Delete an item and its chunks, returning the Qdrant point IDs that
    /// must also be removed from the vector store
    pub async fn delete_item(&self, id: &str) -> Result<Vec<String>> {
        let point_ids = self.get_item_point_ids(id).await?;

        sqlx::query("DELETE FROM chunks WHERE item_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        sqlx::query("DELETE FROM content_items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(point_ids)
    }

    // ===== Chunk Operations =====

    /// Insert or update a chunk
    pub async fn upsert_chunk(&self, chunk: &Chunk) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO chunks (id, item_id, chunk_index, chunk_hash, chunk_text, char_start, char_end, point_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(item_id, chunk_index) DO UPDATE SET
                chunk_hash = excluded.chunk_hash,
                chunk_text = excluded.chunk_text,
                char_start = excluded.char_start,
                char_end = excluded.char_end,
                point_id = excluded.point_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&chunk.id)
        .bind(&chunk.item_id)
        .bind(chunk.chunk_index)
        .bind(&chunk.chunk_hash)
        .bind(&chunk.chunk_text)
        .bind(chunk.char_start)
        .bind(chunk.char_end)
        .bind(&chunk.point_id)
        .bind(&chunk.created_at)
        .bind(&chunk.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get chunks for an item, in order
    pub async fn get_chunks(&self, item_id: &str) -> Result<Vec<Chunk>> {
        let chunks = sqlx::query_as::<_, Chunk>(
            "SELECT * FROM chunks WHERE item_id = ? ORDER BY chunk_index",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(chunks)
    }

    /// Get chunk by Qdrant point ID
    pub async fn get_chunk_by_point_id(&self, point_id: &str) -> Result<Option<Chunk>> {
        let chunk = sqlx::query_as::<_, Chunk>("SELECT * FROM chunks WHERE point_id = ?")
            .bind(point_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(chunk)
    }

    /// Delete chunks with index >= given value, returning their point IDs.
    /// Used when a re-ingested item produced fewer chunks than before.
    pub async fn delete_chunks_from_index(
        &self,
        item_id: &str,
        from_index: i32,
    ) -> Result<Vec<String>> {
        let point_ids: Vec<String> = sqlx::query_scalar(
            "SELECT point_id FROM chunks WHERE item_id = ? AND chunk_index >= ?",
        )
        .bind(item_id)
        .bind(from_index)
        .fetch_all(&self.pool)
        .await?;

        sqlx::query("DELETE FROM chunks WHERE item_id = ? AND chunk_index >= ?")
            .bind(item_id)
            .bind(from_index)
            .execute(&self.pool)
            .await?;

        Ok(point_ids)
    }

    /// Get all Qdrant point IDs for an item
    pub async fn get_item_point_ids(&self, item_id: &str) -> Result<Vec<String>> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT point_id FROM chunks WHERE item_id = ?")
                .bind(item_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids)
    }

    // ===== Crawl Run Operations =====

    /// Start a new crawl run
    pub async fn start_crawl_run(&self, seed_url: &str) -> Result<CrawlRun> {
        let run = CrawlRun::new(seed_url.to_string());
        sqlx::query(
            r#"
            INSERT INTO crawl_runs (id, seed_url, started_at, status, pages_fetched, pages_failed)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&run.id)
        .bind(&run.seed_url)
        .bind(&run.started_at)
        .bind(&run.status)
        .bind(run.pages_fetched)
        .bind(run.pages_failed)
        .execute(&self.pool)
        .await?;
        Ok(run)
    }

    /// Complete a crawl run
    pub async fn complete_crawl_run(
        &self,
        id: &str,
        status: RunStatus,
        pages_fetched: i32,
        pages_failed: i32,
        errors: Option<Vec<String>>,
    ) -> Result<()> {
        let errors_json = errors.map(|e| serde_json::to_string(&e).unwrap_or_default());
        sqlx::query(
            r#"
            UPDATE crawl_runs SET
                completed_at = ?,
                status = ?,
                pages_fetched = ?,
                pages_failed = ?,
                errors_json = ?
            WHERE id = ?
            "#,
        )
        .bind(Utc::now().to_rfc3339())
        .bind(status.to_string())
        .bind(pages_fetched)
        .bind(pages_failed)
        .bind(errors_json)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get the most recently started crawl run, if any
    pub async fn get_latest_crawl_run(&self) -> Result<Option<CrawlRun>> {
        let run = sqlx::query_as::<_, CrawlRun>(
            "SELECT * FROM crawl_runs ORDER BY started_at DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(run)
    }

    // ===== Statistics =====

    /// Get global statistics
    pub async fn get_global_stats(&self) -> Result<GlobalStats> {
        let item_count: i32 = sqlx::query_scalar("SELECT COUNT(*) FROM content_items")
            .fetch_one(&self.pool)
            .await?;

        let chunk_count: i32 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await?;

        let total_words: Option<i64> =
            sqlx::query_scalar("SELECT SUM(word_count) FROM content_items")
                .fetch_one(&self.pool)
                .await?;

        Ok(GlobalStats {
            item_count: item_count as usize,
            chunk_count: chunk_count as usize,
            total_words: total_words.unwrap_or(0) as usize,
        })
    }
}

/// Global statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalStats {
    pub item_count: usize,
    pub chunk_count: usize,
    pub total_words: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn setup_test_db() -> (MetaDb, TempDir) {
        let tmp = TempDir::new().unwrap();
        let db = MetaDb::new(&tmp.path().join("test.db")).await.unwrap();
        (db, tmp)
    }

    fn sample_item(url: &str) -> ContentItem {
        ContentItem::new(
            stable_item_id(Some(url), "body text"),
            Some(url.to_string()),
            "Example Page".to_string(),
            ContentType::WebPage,
            120,
            "hash1".to_string(),
        )
    }

    #[test]
    fn test_stable_item_id() {
        let a = stable_item_id(Some("https://example.com/a"), "ignored");
        let b = stable_item_id(Some("https://example.com/a"), "different text");
        assert_eq!(a, b);

        let c = stable_item_id(Some("https://example.com/b"), "ignored");
        assert_ne!(a, c);

        let t1 = stable_item_id(None, "pasted text body");
        let t2 = stable_item_id(None, "pasted text body");
        assert_eq!(t1, t2);
    }

    #[tokio::test]
    async fn test_item_upsert_same_url_same_row() {
        let (db, _tmp) = setup_test_db().await;

        let item = sample_item("https://example.com/page");
        db.upsert_item(&item).await.unwrap();

        // Re-ingest: same URL maps to the same id and updates in place
        let mut again = sample_item("https://example.com/page");
        again.content_hash = "hash2".to_string();
        assert_eq!(again.id, item.id);
        db.upsert_item(&again).await.unwrap();

        let items = db.list_items().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content_hash, "hash2");
    }

    #[tokio::test]
    async fn test_chunk_resolves_to_one_item() {
        let (db, _tmp) = setup_test_db().await;

        let item = sample_item("https://example.com/page");
        db.upsert_item(&item).await.unwrap();

        let chunk = Chunk::new(
            item.id.clone(),
            0,
            "chunk_hash_1".to_string(),
            "First chunk text".to_string(),
            0,
            16,
        );
        db.upsert_chunk(&chunk).await.unwrap();

        let resolved = db
            .get_chunk_by_point_id(&chunk.point_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.item_id, item.id);
    }

    #[tokio::test]
    async fn test_delete_item_cascades_chunks() {
        let (db, _tmp) = setup_test_db().await;

        let item = sample_item("https://example.com/page");
        db.upsert_item(&item).await.unwrap();

        for i in 0..3 {
            let chunk = Chunk::new(
                item.id.clone(),
                i,
                format!("chunk_hash_{}", i),
                format!("chunk {}", i),
                i * 10,
                i * 10 + 8,
            );
            db.upsert_chunk(&chunk).await.unwrap();
        }

        let point_ids = db.delete_item(&item.id).await.unwrap();
        assert_eq!(point_ids.len(), 3);

        assert!(db.get_item(&item.id).await.unwrap().is_none());
        assert!(db.get_chunks(&item.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_chunks_from_index() {
        let (db, _tmp) = setup_test_db().await;

        let item = sample_item("https://example.com/page");
        db.upsert_item(&item).await.unwrap();

        for i in 0..5 {
            let chunk = Chunk::new(
                item.id.clone(),
                i,
                format!("hash_{}", i),
                format!("chunk {}", i),
                i * 10,
                i * 10 + 8,
            );
            db.upsert_chunk(&chunk).await.unwrap();
        }

        let removed = db.delete_chunks_from_index(&item.id, 3).await.unwrap();
        assert_eq!(removed.len(), 2);

        let remaining = db.get_chunks(&item.id).await.unwrap();
        assert_eq!(remaining.len(), 3);
    }

    #[tokio::test]
    async fn test_crawl_run_lifecycle() {
        let (db, _tmp) = setup_test_db().await;

        let run = db.start_crawl_run("https://example.com").await.unwrap();
        db.complete_crawl_run(
            &run.id,
            RunStatus::Completed,
            4,
            1,
            Some(vec!["https://example.com/broken: 404".to_string()]),
        )
        .await
        .unwrap();

        let latest = db.get_latest_crawl_run().await.unwrap().unwrap();
        assert_eq!(latest.seed_url, "https://example.com");
        assert_eq!(latest.status, "completed");
        assert_eq!(latest.pages_fetched, 4);
        assert_eq!(latest.pages_failed, 1);
    }
}
