//! Add command implementation: single URL or pasted text

use crate::config::Config;
use crate::crawl::Crawler;
use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::ingest::{IngestInput, IngestOutcome, Ingestor};
use crate::llm::LlmClient;
use crate::meta::{ContentType, MetaDb};
use crate::parse::{cap_content, parse_plain_text};
use crate::store::QdrantStore;
use tracing::info;

/// Fetch one URL and ingest it
pub async fn cmd_add_url(
    config: &Config,
    db: &MetaDb,
    store: &QdrantStore,
    embedder: &dyn Embedder,
    llm: Option<&LlmClient>,
    url: &str,
) -> Result<IngestOutcome> {
    info!("Adding URL: {}", url);

    let crawler = Crawler::new(config.crawl.clone())?;
    let page = crawler.fetch(url).await?;

    if page.text.trim().is_empty() {
        return Err(Error::Parse(format!(
            "No readable text extracted from {}",
            url
        )));
    }

    let ingestor = Ingestor::new(config, db, store, embedder, llm);
    ingestor
        .ingest(IngestInput {
            url: Some(page.url),
            title: page.title,
            text: page.text,
            content_type: ContentType::WebPage,
        })
        .await
}

/// Ingest pasted or piped text
pub async fn cmd_add_text(
    config: &Config,
    db: &MetaDb,
    store: &QdrantStore,
    embedder: &dyn Embedder,
    llm: Option<&LlmClient>,
    title: Option<String>,
    text: &str,
) -> Result<IngestOutcome> {
    let text = prepare_text(text, config.crawl.max_content_chars)?;

    info!("Adding text document ({} chars)", text.chars().count());

    let ingestor = Ingestor::new(config, db, store, embedder, llm);
    ingestor
        .ingest(IngestInput {
            url: None,
            title,
            text,
            content_type: ContentType::TextDocument,
        })
        .await
}

/// Normalize pasted text and cap its length
fn prepare_text(text: &str, max_content_chars: usize) -> Result<String> {
    let doc = parse_plain_text(text);
    if doc.text.is_empty() {
        return Err(Error::Parse("No text provided".to_string()));
    }
    Ok(cap_content(&doc.text, max_content_chars).to_string())
}

/// Print the result of a single-item ingest
pub fn print_ingest_outcome(outcome: &IngestOutcome) {
    println!("\n✓ Added: {}", outcome.title);
    println!("  ID: {}", outcome.item_id);
    println!("  Words: {}", outcome.word_count);
    println!("  Chunks: {}", outcome.chunks_created);
    if outcome.chunks_deleted > 0 {
        println!("  Stale chunks removed: {}", outcome.chunks_deleted);
    }
    if !outcome.summary_generated {
        println!("  (summary unavailable; stored a text preview instead)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_text_normalizes_whitespace() {
        let prepared = prepare_text("  Some   pasted\n\n\n\ntext  ", 50_000).unwrap();
        assert_eq!(prepared, "Some pasted\n\ntext");
    }

    #[test]
    fn test_prepare_text_rejects_blank_input() {
        assert!(matches!(prepare_text("   \n\t ", 50_000), Err(Error::Parse(_))));
        assert!(matches!(prepare_text("", 50_000), Err(Error::Parse(_))));
    }

    #[test]
    fn test_prepare_text_caps_length() {
        let long = "word ".repeat(100);
        let prepared = prepare_text(&long, 20).unwrap();
        assert_eq!(prepared.chars().count(), 20);
    }
}
