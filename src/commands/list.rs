//! List command implementation

use crate::error::Result;
use crate::meta::MetaDb;
use serde::{Deserialize, Serialize};

/// One library item with its chunk count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemInfo {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    pub content_type: String,
    pub word_count: i64,
    pub chunk_count: usize,
    pub summary: Option<String>,
    pub fetched_at: String,
}

/// List all items in the library, newest first
pub async fn cmd_list(db: &MetaDb) -> Result<Vec<ItemInfo>> {
    let items = db.list_items().await?;
    let mut result = Vec::with_capacity(items.len());

    for item in items {
        let chunk_count = db.get_chunks(&item.id).await?.len();
        result.push(ItemInfo {
            id: item.id,
            title: item.title,
            url: item.url,
            content_type: item.content_type,
            word_count: item.word_count,
            chunk_count,
            summary: item.summary,
            fetched_at: item.fetched_at,
        });
    }

    Ok(result)
}

/// Print items to console
pub fn print_items(items: &[ItemInfo]) {
    println!("\n📚 Library Contents\n");

    if items.is_empty() {
        println!("Library is empty. Use 'curator add' or 'curator crawl' to add content.");
        return;
    }

    for item in items {
        println!("• {} [{}]", item.title, item.content_type);
        println!("  ID: {}", item.id);
        if let Some(url) = &item.url {
            println!("  URL: {}", url);
        }
        println!(
            "  Words: {}, Chunks: {}",
            item.word_count, item.chunk_count
        );
        if let Some(summary) = &item.summary {
            let preview: String = summary.chars().take(160).collect();
            println!("  {}", preview.replace('\n', " "));
        }
        println!("  Added: {}", item.fetched_at);
        println!();
    }
}
