//! Shared ingestion pipeline
//!
//! Everything that turns extracted text into stored, searchable content:
//! stable item identity, optional LLM summary, chunking, embedding, and
//! persistence to SQLite and Qdrant.

use crate::chunk::{chunk_text, compute_text_hash};
use crate::config::Config;
use crate::embed::{embed_in_batches, Embedder};
use crate::error::Result;
use crate::llm::{ChatMessage, LlmClient};
use crate::meta::{stable_item_id, Chunk, ContentItem, ContentType, MetaDb};
use crate::parse::count_words;
use crate::store::{ChunkPayload, ChunkPoint, QdrantStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Content handed to the pipeline, already extracted and capped
#[derive(Debug, Clone)]
pub struct IngestInput {
    pub url: Option<String>,
    pub title: Option<String>,
    pub text: String,
    pub content_type: ContentType,
}

/// Statistics from ingesting one item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub item_id: String,
    pub title: String,
    pub word_count: usize,
    pub chunks_created: usize,
    pub chunks_deleted: usize,
    pub summary_generated: bool,
}

/// Ingestion pipeline over the shared stores
pub struct Ingestor<'a> {
    config: &'a Config,
    db: &'a MetaDb,
    store: &'a QdrantStore,
    embedder: &'a dyn Embedder,
    llm: Option<&'a LlmClient>,
}

impl<'a> Ingestor<'a> {
    pub fn new(
        config: &'a Config,
        db: &'a MetaDb,
        store: &'a QdrantStore,
        embedder: &'a dyn Embedder,
        llm: Option<&'a LlmClient>,
    ) -> Self {
        Self {
            config,
            db,
            store,
            embedder,
            llm,
        }
    }

    /// Ingest one piece of content: summarize, chunk, embed, persist.
    /// Re-ingesting the same source updates the existing item in place.
    pub async fn ingest(&self, input: IngestInput) -> Result<IngestOutcome> {
        let item_id = stable_item_id(input.url.as_deref(), &input.text);
        let content_hash = compute_text_hash(&input.text);
        let title = resolve_title(input.title.as_deref(), input.url.as_deref(), &input.text);
        let word_count = count_words(&input.text);

        debug!(item_id = %item_id, title = %title, "Ingesting content");

        // Summary is best-effort: a failure degrades to a text preview
        let (summary, summary_generated) = self.summarize(&input.text).await;

        let mut item = ContentItem::new(
            item_id.clone(),
            input.url.clone(),
            title.clone(),
            input.content_type,
            word_count,
            content_hash.clone(),
        );
        item.summary = Some(summary);
        self.db.upsert_item(&item).await?;

        // Chunk and embed
        let chunks = chunk_text(&input.text, &content_hash, &self.config.chunk)?;
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings =
            embed_in_batches(self.embedder, texts, self.config.embedding.batch_size).await?;

        let mut points = Vec::with_capacity(chunks.len());
        for (text_chunk, vector) in chunks.iter().zip(embeddings.into_iter()) {
            let chunk = Chunk::new(
                item_id.clone(),
                text_chunk.index as i32,
                text_chunk.hash.clone(),
                text_chunk.text.clone(),
                text_chunk.char_start as i32,
                text_chunk.char_end as i32,
            );
            self.db.upsert_chunk(&chunk).await?;

            let payload = ChunkPayload::new(
                item_id.clone(),
                input.url.clone(),
                title.clone(),
                input.content_type.to_string(),
                chunk.chunk_index,
                chunk.chunk_hash.clone(),
                chunk.updated_at.clone(),
            );
            points.push(ChunkPoint {
                id: Uuid::parse_str(&chunk.point_id)
                    .unwrap_or_else(|_| Uuid::new_v5(&Uuid::NAMESPACE_OID, chunk.chunk_hash.as_bytes())),
                vector,
                payload,
            });
        }

        self.store.upsert_points(points).await?;

        // Trim chunks left over from a longer previous version
        let stale_point_ids = self
            .db
            .delete_chunks_from_index(&item_id, chunks.len() as i32)
            .await?;
        let stale_uuids: Vec<Uuid> = stale_point_ids
            .iter()
            .filter_map(|s| Uuid::parse_str(s).ok())
            .collect();
        self.store.delete_points(&stale_uuids).await?;

        info!(
            item_id = %item_id,
            chunks = chunks.len(),
            stale = stale_uuids.len(),
            "Ingested {}",
            title
        );

        Ok(IngestOutcome {
            item_id,
            title,
            word_count,
            chunks_created: chunks.len(),
            chunks_deleted: stale_uuids.len(),
            summary_generated,
        })
    }

    async fn summarize(&self, text: &str) -> (String, bool) {
        if !self.config.summary.enabled {
            return (preview_summary(text), false);
        }

        let Some(llm) = self.llm else {
            return (preview_summary(text), false);
        };

        let messages = summary_messages(text);
        match llm.complete(messages, self.config.summary.temperature).await {
            Ok(summary) if !summary.is_empty() => (summary, true),
            Ok(_) => {
                warn!("Summary generation returned empty text; using preview");
                (preview_summary(text), false)
            }
            Err(e) => {
                warn!("Summary generation failed ({}); using preview", e);
                (preview_summary(text), false)
            }
        }
    }
}

/// Build the summary prompt for a piece of content
pub fn summary_messages(text: &str) -> Vec<ChatMessage> {
    // Keep the prompt bounded; very long pages are summarized from the top
    let excerpt: String = text.chars().take(12_000).collect();
    vec![
        ChatMessage::system(
            "You summarize web content for a personal content library. \
             Reply with a concise 2-3 sentence summary of the main points.",
        ),
        ChatMessage::user(excerpt),
    ]
}

/// Fallback summary: the first part of the content
pub fn preview_summary(text: &str) -> String {
    let preview: String = text.chars().take(200).collect();
    if text.chars().count() > 200 {
        format!("{}...", preview.trim_end())
    } else {
        preview
    }
}

/// Pick a display title: explicit title, then URL, then first words of text
pub fn resolve_title(title: Option<&str>, url: Option<&str>, text: &str) -> String {
    if let Some(t) = title {
        let t = t.trim();
        if !t.is_empty() {
            return t.to_string();
        }
    }

    if let Some(u) = url {
        return u.to_string();
    }

    let first_line = text.lines().next().unwrap_or("").trim();
    if first_line.is_empty() {
        "Untitled document".to_string()
    } else {
        let short: String = first_line.chars().take(80).collect();
        short
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_summary_truncates() {
        let text = "word ".repeat(100);
        let preview = preview_summary(&text);
        assert!(preview.ends_with("..."));
        assert!(preview.chars().count() <= 204);
    }

    #[test]
    fn test_preview_summary_short_text_unchanged() {
        assert_eq!(preview_summary("short text"), "short text");
    }

    #[test]
    fn test_resolve_title_precedence() {
        assert_eq!(
            resolve_title(Some("Page Title"), Some("https://a.example"), "body"),
            "Page Title"
        );
        assert_eq!(
            resolve_title(None, Some("https://a.example"), "body"),
            "https://a.example"
        );
        assert_eq!(
            resolve_title(None, None, "First line\nsecond line"),
            "First line"
        );
        assert_eq!(resolve_title(Some("  "), None, ""), "Untitled document");
    }

    #[test]
    fn test_summary_messages_shape() {
        let messages = summary_messages("some content");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "some content");
    }
}
