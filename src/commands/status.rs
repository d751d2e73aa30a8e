//! Status command implementation

use crate::config::Config;
use crate::error::Result;
use crate::meta::{CrawlRun, GlobalStats, MetaDb};
use crate::store::QdrantStore;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Status information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusInfo {
    pub config_path: String,
    pub db_path: String,
    pub qdrant_url: String,
    pub collection_name: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub api_key_set: bool,
    pub qdrant_connected: bool,
    pub collection_exists: bool,
    pub qdrant_points: usize,
    pub db_stats: GlobalStats,
    pub last_crawl: Option<CrawlRun>,
}

/// Get system status
pub async fn cmd_status(config: &Config, db: &MetaDb, store: &QdrantStore) -> Result<StatusInfo> {
    info!("Getting status");

    let db_stats = db.get_global_stats().await?;
    let last_crawl = db.get_latest_crawl_run().await?;

    let (qdrant_connected, collection_exists, qdrant_points) = match store.collection_exists().await
    {
        Ok(true) => match store.get_stats().await {
            Ok(stats) => (true, true, stats.points_count),
            Err(e) => {
                tracing::debug!("Qdrant stats error: {:?}", e);
                (true, true, 0)
            }
        },
        Ok(false) => (true, false, 0),
        Err(e) => {
            tracing::debug!("Qdrant connection error: {:?}", e);
            (false, false, 0)
        }
    };

    Ok(StatusInfo {
        config_path: config.paths.config_file.display().to_string(),
        db_path: config.paths.db_file.display().to_string(),
        qdrant_url: config.qdrant_url.clone(),
        collection_name: config.collection_name.clone(),
        chat_model: config.openai.chat_model.clone(),
        embedding_model: config.openai.embedding_model.clone(),
        api_key_set: config.api_key().is_ok(),
        qdrant_connected,
        collection_exists,
        qdrant_points,
        db_stats,
        last_crawl,
    })
}

/// Print status to console
pub fn print_status(status: &StatusInfo) {
    println!("\n📊 curator Status\n");
    println!("Configuration: {}", status.config_path);
    println!("Database: {}", status.db_path);

    println!("\nQdrant:");
    println!("  URL: {}", status.qdrant_url);
    println!("  Collection: {}", status.collection_name);

    let connection_status = if status.qdrant_connected {
        if status.collection_exists {
            "✓ Connected"
        } else {
            "⚠ Connected (collection not created; run 'curator db init')"
        }
    } else {
        "✗ Not connected"
    };
    println!("  Status: {}", connection_status);
    println!("  Points: {}", status.qdrant_points);

    println!("\nModels:");
    println!("  Chat: {}", status.chat_model);
    println!("  Embedding: {}", status.embedding_model);
    println!(
        "  API key: {}",
        if status.api_key_set { "✓ set" } else { "✗ not set" }
    );

    println!("\nLibrary:");
    println!("  Items: {}", status.db_stats.item_count);
    println!("  Chunks: {}", status.db_stats.chunk_count);
    println!("  Total words: {}", status.db_stats.total_words);

    if let Some(run) = &status.last_crawl {
        println!("\nLast crawl:");
        println!("  Seed: {}", run.seed_url);
        println!("  Started: {}", run.started_at);
        println!(
            "  Result: {} ({} fetched, {} failed)",
            run.status, run.pages_fetched, run.pages_failed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::RunStatus;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_status_reports_latest_crawl_run() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.init_paths(Some(tmp.path().to_path_buf()));
        // Unreachable Qdrant; status should degrade to "not connected"
        config.qdrant_url = "http://127.0.0.1:1".to_string();

        let db = MetaDb::new(&config.paths.db_file).await.unwrap();
        let run = db.start_crawl_run("https://example.com/docs").await.unwrap();
        db.complete_crawl_run(&run.id, RunStatus::Completed, 3, 1, None)
            .await
            .unwrap();

        let store = QdrantStore::connect(&config).await.unwrap();
        let status = cmd_status(&config, &db, &store).await.unwrap();

        assert!(!status.qdrant_connected);
        let last = status.last_crawl.expect("crawl run should be reported");
        assert_eq!(last.seed_url, "https://example.com/docs");
        assert_eq!(last.pages_fetched, 3);
        assert_eq!(last.pages_failed, 1);
    }

    #[tokio::test]
    async fn test_status_without_crawl_history() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.init_paths(Some(tmp.path().to_path_buf()));
        config.qdrant_url = "http://127.0.0.1:1".to_string();

        let db = MetaDb::new(&config.paths.db_file).await.unwrap();
        let store = QdrantStore::connect(&config).await.unwrap();
        let status = cmd_status(&config, &db, &store).await.unwrap();

        assert!(status.last_crawl.is_none());
        assert_eq!(status.db_stats.item_count, 0);
    }
}
