//! Crawl command implementation

use crate::config::{Config, CRAWL_MAX_PAGES_LIMIT};
use crate::crawl::{Crawler, PageOutcome};
use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::ingest::{IngestInput, IngestOutcome, Ingestor};
use crate::llm::LlmClient;
use crate::meta::{ContentType, MetaDb, RunStatus};
use crate::progress::count_bar;
use crate::store::QdrantStore;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Statistics from one crawl run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlStats {
    pub run_id: String,
    pub seed_url: String,
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub items: Vec<IngestOutcome>,
    pub errors: Vec<String>,
}

/// Crawl a site from a seed URL and ingest every fetched page.
/// A failed page is recorded and skipped; it never aborts the run.
pub async fn cmd_crawl(
    config: &Config,
    db: &MetaDb,
    store: &QdrantStore,
    embedder: &dyn Embedder,
    llm: Option<&LlmClient>,
    seed_url: &str,
    max_pages: Option<u32>,
) -> Result<CrawlStats> {
    let mut crawl_config = config.crawl.clone();
    if let Some(pages) = max_pages {
        if pages == 0 || pages > CRAWL_MAX_PAGES_LIMIT {
            return Err(Error::Config(format!(
                "--max-pages must be between 1 and {}",
                CRAWL_MAX_PAGES_LIMIT
            )));
        }
        crawl_config.max_pages = pages;
    }

    info!(
        "Crawling {} (up to {} pages)",
        seed_url, crawl_config.max_pages
    );

    let run = db.start_crawl_run(seed_url).await?;
    let crawler = Crawler::new(crawl_config.clone())?;

    let results = match crawler.crawl(seed_url).await {
        Ok(results) => results,
        Err(e) => {
            db.complete_crawl_run(&run.id, RunStatus::Failed, 0, 0, Some(vec![e.to_string()]))
                .await?;
            return Err(e);
        }
    };

    let mut stats = CrawlStats {
        run_id: run.id.clone(),
        seed_url: seed_url.to_string(),
        pages_fetched: 0,
        pages_failed: 0,
        items: Vec::new(),
        errors: Vec::new(),
    };

    let fetched: Vec<_> = results
        .into_iter()
        .filter_map(|r| match r.outcome {
            PageOutcome::Fetched(page) => Some(page),
            PageOutcome::Failed(reason) => {
                stats.pages_failed += 1;
                stats.errors.push(format!("{}: {}", r.url, reason));
                None
            }
        })
        .collect();

    let ingestor = Ingestor::new(config, db, store, embedder, llm);
    let bar = count_bar(fetched.len() as u64, "Ingesting pages");

    for page in fetched {
        let url = page.url.clone();
        let input = IngestInput {
            url: Some(page.url),
            title: page.title,
            text: page.text,
            content_type: ContentType::WebPage,
        };

        match ingestor.ingest(input).await {
            Ok(outcome) => {
                stats.pages_fetched += 1;
                stats.items.push(outcome);
            }
            Err(e) => {
                warn!("Failed to ingest {}: {}", url, e);
                stats.pages_failed += 1;
                stats.errors.push(format!("{}: {}", url, e));
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    let status = if stats.pages_fetched > 0 || stats.pages_failed == 0 {
        RunStatus::Completed
    } else {
        RunStatus::Failed
    };
    let errors = if stats.errors.is_empty() {
        None
    } else {
        Some(stats.errors.clone())
    };
    db.complete_crawl_run(
        &run.id,
        status,
        stats.pages_fetched as i32,
        stats.pages_failed as i32,
        errors,
    )
    .await?;

    Ok(stats)
}

/// Print crawl statistics to console
pub fn print_crawl_stats(stats: &CrawlStats) {
    println!("\n✓ Crawl complete: {}", stats.seed_url);
    println!("  Pages ingested: {}", stats.pages_fetched);
    println!("  Pages failed: {}", stats.pages_failed);

    for item in &stats.items {
        println!("  • {} ({} chunks)", item.title, item.chunks_created);
    }

    if !stats.errors.is_empty() {
        println!("\nErrors:");
        for error in &stats.errors {
            println!("  ✗ {}", error);
        }
    }
}
