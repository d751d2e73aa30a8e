//! Library-level content analysis
//!
//! LLM-driven overviews of what has been collected: themes, trends and
//! reading suggestions, plus per-item topic tags.

use crate::error::Result;
use crate::llm::{ChatMessage, LlmClient};
use crate::meta::{ContentItem, GlobalStats};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// How many items get full detail in the analysis prompt
const DETAIL_ITEM_LIMIT: usize = 8;
/// Per-item summary budget in the prompt, in characters
const SUMMARY_CHAR_LIMIT: usize = 200;

/// Result of analyzing the whole library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryAnalysis {
    pub overview: String,
    pub trends: String,
    pub strategy: String,
}

/// Topic tags for one item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemTags {
    pub item_id: String,
    pub title: String,
    pub tags: Vec<String>,
}

/// Analyze the library: one LLM pass each for themes, trends and a
/// collection strategy suggestion.
pub async fn analyze_library(
    items: &[ContentItem],
    stats: &GlobalStats,
    llm: &LlmClient,
    temperature: f32,
) -> Result<LibraryAnalysis> {
    let digest = library_digest(items, stats);

    let overview = llm
        .complete(analysis_messages(&digest, OVERVIEW_INSTRUCTION), temperature)
        .await?;
    let trends = llm
        .complete(analysis_messages(&digest, TRENDS_INSTRUCTION), temperature)
        .await?;

    // The strategy prompt builds on the identified trends
    let strategy_input = format!("{}\n\nObserved trends:\n{}", digest, trends);
    let strategy = llm
        .complete(
            analysis_messages(&strategy_input, STRATEGY_INSTRUCTION),
            temperature,
        )
        .await?;

    Ok(LibraryAnalysis {
        overview,
        trends,
        strategy,
    })
}

/// Generate topic tags per item. A failed tag request degrades to an
/// empty tag list with a warning rather than failing the whole run.
pub async fn generate_tags(
    items: &[ContentItem],
    llm: &LlmClient,
    temperature: f32,
) -> Result<Vec<ItemTags>> {
    let mut tagged = Vec::with_capacity(items.len());

    for item in items {
        let messages = tag_messages(item);
        let tags = match llm.complete(messages, temperature).await {
            Ok(reply) => parse_tags(&reply),
            Err(e) => {
                warn!("Tag generation failed for {} ({}); skipping", item.title, e);
                Vec::new()
            }
        };

        tagged.push(ItemTags {
            item_id: item.id.clone(),
            title: item.title.clone(),
            tags,
        });
    }

    Ok(tagged)
}

const OVERVIEW_INSTRUCTION: &str =
    "Summarize the main themes of this content library in one short paragraph.";
const TRENDS_INSTRUCTION: &str =
    "Identify trends or patterns in what has been collected, in 2-3 bullet points.";
const STRATEGY_INSTRUCTION: &str =
    "Suggest what kind of content would complement this library, in 2-3 bullet points.";

fn analysis_messages(digest: &str, instruction: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(
            "You analyze a personal content library. Base your answer only on \
             the item list provided.",
        ),
        ChatMessage::user(format!("{}\n\n{}", digest, instruction)),
    ]
}

fn tag_messages(item: &ContentItem) -> Vec<ChatMessage> {
    let summary = item
        .summary
        .as_deref()
        .unwrap_or("")
        .chars()
        .take(SUMMARY_CHAR_LIMIT)
        .collect::<String>();

    vec![
        ChatMessage::system(
            "You assign topic tags to saved content. Reply with 3-5 short \
             lowercase tags separated by commas, nothing else.",
        ),
        ChatMessage::user(format!("Title: {}\nSummary: {}", item.title, summary)),
    ]
}

/// Build a bounded text digest of the library for analysis prompts.
/// The first few items get their summaries; the rest are counted.
pub fn library_digest(items: &[ContentItem], stats: &GlobalStats) -> String {
    let mut digest = format!(
        "Library: {} items, {} chunks, {} words total.\n\nItems:\n",
        stats.item_count, stats.chunk_count, stats.total_words
    );

    for item in items.iter().take(DETAIL_ITEM_LIMIT) {
        let summary: String = item
            .summary
            .as_deref()
            .unwrap_or("(no summary)")
            .chars()
            .take(SUMMARY_CHAR_LIMIT)
            .collect();
        digest.push_str(&format!(
            "- {} [{}]: {}\n",
            item.title, item.content_type, summary
        ));
    }

    if items.len() > DETAIL_ITEM_LIMIT {
        digest.push_str(&format!(
            "...and {} more items.\n",
            items.len() - DETAIL_ITEM_LIMIT
        ));
    }

    digest
}

/// Parse a comma-separated tag reply into clean tags
pub fn parse_tags(reply: &str) -> Vec<String> {
    reply
        .split(',')
        .map(|t| t.trim().trim_matches('.').to_lowercase())
        .filter(|t| !t.is_empty())
        .take(5)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{stable_item_id, ContentType};

    fn sample_item(n: usize) -> ContentItem {
        let url = format!("https://example.com/{}", n);
        let mut item = ContentItem::new(
            stable_item_id(Some(&url), "body"),
            Some(url),
            format!("Item {}", n),
            ContentType::WebPage,
            100,
            format!("hash-{}", n),
        );
        item.summary = Some("A summary. ".repeat(30));
        item
    }

    #[test]
    fn test_digest_caps_item_detail() {
        let items: Vec<ContentItem> = (0..12).map(sample_item).collect();
        let stats = GlobalStats {
            item_count: 12,
            chunk_count: 40,
            total_words: 1200,
        };

        let digest = library_digest(&items, &stats);

        assert!(digest.contains("Item 7"));
        assert!(!digest.contains("Item 8"));
        assert!(digest.contains("...and 4 more items."));
    }

    #[test]
    fn test_digest_truncates_summaries() {
        let items = vec![sample_item(0)];
        let stats = GlobalStats {
            item_count: 1,
            chunk_count: 3,
            total_words: 100,
        };

        let digest = library_digest(&items, &stats);
        let item_line = digest
            .lines()
            .find(|l| l.starts_with("- Item 0"))
            .expect("item line present");

        assert!(item_line.chars().count() < 250);
    }

    #[test]
    fn test_parse_tags() {
        let tags = parse_tags("Rust, web scraping , Databases.\n");
        assert_eq!(tags, vec!["rust", "web scraping", "databases"]);
    }

    #[test]
    fn test_parse_tags_caps_at_five() {
        let tags = parse_tags("a, b, c, d, e, f, g");
        assert_eq!(tags.len(), 5);
    }

    #[test]
    fn test_parse_tags_empty_reply() {
        assert!(parse_tags("").is_empty());
        assert!(parse_tags(" , ,").is_empty());
    }
}
