//! Search command implementation

use crate::config::Config;
use crate::embed::Embedder;
use crate::error::Result;
use crate::meta::MetaDb;
use crate::rag::{retrieve, SearchHit};
use crate::store::{QdrantStore, SearchFilter};
use tracing::info;

/// Search options
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Number of results (defaults to config chat.top_k)
    pub limit: Option<usize>,

    /// Minimum similarity score threshold
    pub min_score: Option<f32>,

    /// Restrict to one content type ("web_page" or "text_document")
    pub content_type: Option<String>,
}

/// Semantic search over the library
pub async fn cmd_search(
    config: &Config,
    db: &MetaDb,
    store: &QdrantStore,
    embedder: &dyn Embedder,
    query: &str,
    options: SearchOptions,
) -> Result<Vec<SearchHit>> {
    let limit = options.limit.unwrap_or(config.chat.top_k);
    info!("Searching for: {} (limit {})", query, limit);

    let filter = options.content_type.map(|ct| SearchFilter {
        content_types: Some(vec![ct]),
        ..Default::default()
    });

    let mut hits = retrieve(db, store, embedder, query, limit, filter).await?;

    if let Some(min_score) = options.min_score {
        hits.retain(|h| h.score >= min_score);
    }

    Ok(hits)
}

/// Print search results to console
pub fn print_search_results(query: &str, hits: &[SearchHit]) {
    println!("\n🔍 Query: {}\n", query);

    if hits.is_empty() {
        println!("No results found.");
        return;
    }

    for (i, hit) in hits.iter().enumerate() {
        println!("{}. {} [score: {:.3}]", i + 1, hit.title, hit.score);
        if let Some(url) = &hit.url {
            println!("   {}", url);
        }

        let preview: String = hit.chunk_text.chars().take(200).collect();
        let preview = preview.replace('\n', " ");
        println!("   {}...\n", preview.trim());
    }
}
