//! Retrieval-augmented generation
//!
//! Semantic retrieval over the indexed chunks plus a conversational
//! layer that grounds LLM answers in retrieved context.

use crate::config::Config;
use crate::embed::Embedder;
use crate::error::Result;
use crate::llm::{ChatMessage, LlmClient};
use crate::meta::MetaDb;
use crate::store::{QdrantStore, SearchFilter};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// One retrieved chunk with its source metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub item_id: String,
    pub url: Option<String>,
    pub title: String,
    pub chunk_index: i32,
    pub chunk_text: String,
    pub score: f32,
}

/// A source reference attached to a chat answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    pub title: String,
    pub url: Option<String>,
    pub score: f32,
}

/// An answer produced from retrieved context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

/// Embed a query and return the top matching chunks, enriched with
/// chunk text from the metadata database.
pub async fn retrieve(
    db: &MetaDb,
    store: &QdrantStore,
    embedder: &dyn Embedder,
    query: &str,
    top_k: usize,
    filter: Option<SearchFilter>,
) -> Result<Vec<SearchHit>> {
    let vectors = embedder.embed(vec![query.to_string()]).await?;
    let Some(query_vector) = vectors.into_iter().next() else {
        return Ok(Vec::new());
    };

    // Over-fetch so hits whose chunk rows have gone missing can be dropped
    let results = store.search(query_vector, top_k * 2, filter).await?;
    debug!("Retrieved {} candidate points for query", results.len());

    let mut hits = Vec::with_capacity(top_k);
    for result in results {
        let Some(chunk) = db.get_chunk_by_point_id(&result.id).await? else {
            debug!("Point {} has no chunk row; skipping", result.id);
            continue;
        };

        hits.push(SearchHit {
            item_id: result.payload.item_id,
            url: result.payload.url,
            title: result.payload.title,
            chunk_index: chunk.chunk_index,
            chunk_text: chunk.chunk_text,
            score: result.score,
        });

        if hits.len() >= top_k {
            break;
        }
    }

    Ok(hits)
}

/// Conversational RAG session with bounded history
pub struct RagChat {
    history: VecDeque<(String, String)>,
    max_history_turns: usize,
    top_k: usize,
    temperature: f32,
}

impl RagChat {
    pub fn new(config: &Config) -> Self {
        Self {
            history: VecDeque::new(),
            max_history_turns: config.chat.max_history_turns,
            top_k: config.chat.top_k,
            temperature: config.chat.temperature,
        }
    }

    /// Answer a question grounded in the library. Returns a canned
    /// reply without calling the LLM when the library is empty.
    pub async fn ask(
        &mut self,
        db: &MetaDb,
        store: &QdrantStore,
        embedder: &dyn Embedder,
        llm: &LlmClient,
        question: &str,
    ) -> Result<ChatAnswer> {
        let stats = db.get_global_stats().await?;
        if stats.chunk_count == 0 {
            return Ok(ChatAnswer {
                answer: "Your library is empty. Add content with 'curator add' or \
                         'curator crawl' before chatting."
                    .to_string(),
                sources: Vec::new(),
            });
        }

        let hits = retrieve(db, store, embedder, question, self.top_k, None).await?;
        let messages = build_chat_messages(&hits, &self.history, question);
        let answer = llm.complete(messages, self.temperature).await?;

        self.push_turn(question, &answer);

        let sources = dedup_sources(&hits);
        Ok(ChatAnswer { answer, sources })
    }

    /// Forget the conversation so far
    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn push_turn(&mut self, question: &str, answer: &str) {
        self.history
            .push_back((question.to_string(), answer.to_string()));
        while self.history.len() > self.max_history_turns {
            self.history.pop_front();
        }
    }
}

/// Build the message list for a grounded chat completion: system prompt
/// with retrieved context, prior turns, then the new question.
pub fn build_chat_messages(
    hits: &[SearchHit],
    history: &VecDeque<(String, String)>,
    question: &str,
) -> Vec<ChatMessage> {
    let mut context = String::new();
    for (i, hit) in hits.iter().enumerate() {
        let source = hit.url.as_deref().unwrap_or(&hit.title);
        context.push_str(&format!(
            "[{}] {} ({})\n{}\n\n",
            i + 1,
            hit.title,
            source,
            hit.chunk_text
        ));
    }

    let system = if context.is_empty() {
        "You are a helpful assistant for a personal content library. \
         No relevant content was found for this question; say so and \
         suggest adding related content."
            .to_string()
    } else {
        format!(
            "You are a helpful assistant for a personal content library. \
             Answer using only the context below. If the context does not \
             contain the answer, say so.\n\nContext:\n{}",
            context.trim_end()
        )
    };

    let mut messages = Vec::with_capacity(history.len() * 2 + 2);
    messages.push(ChatMessage::system(system));
    for (user_turn, assistant_turn) in history {
        messages.push(ChatMessage::user(user_turn.clone()));
        messages.push(ChatMessage::assistant(assistant_turn.clone()));
    }
    messages.push(ChatMessage::user(question));
    messages
}

/// Collapse hits into one source reference per item, keeping best score
fn dedup_sources(hits: &[SearchHit]) -> Vec<SourceRef> {
    let mut sources: Vec<SourceRef> = Vec::new();
    let mut seen: Vec<&str> = Vec::new();

    for hit in hits {
        if seen.contains(&hit.item_id.as_str()) {
            continue;
        }
        seen.push(&hit.item_id);
        sources.push(SourceRef {
            title: hit.title.clone(),
            url: hit.url.clone(),
            score: hit.score,
        });
    }

    sources
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(item_id: &str, title: &str, score: f32) -> SearchHit {
        SearchHit {
            item_id: item_id.to_string(),
            url: Some(format!("https://example.com/{}", item_id)),
            title: title.to_string(),
            chunk_index: 0,
            chunk_text: format!("text for {}", item_id),
            score,
        }
    }

    #[test]
    fn test_build_chat_messages_includes_context_and_history() {
        let hits = vec![hit("a", "Page A", 0.9)];
        let mut history = VecDeque::new();
        history.push_back(("first question".to_string(), "first answer".to_string()));

        let messages = build_chat_messages(&hits, &history, "second question");

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("Page A"));
        assert!(messages[0].content.contains("text for a"));
        assert_eq!(messages[1].content, "first question");
        assert_eq!(messages[2].role, "assistant");
        assert_eq!(messages[3].content, "second question");
    }

    #[test]
    fn test_build_chat_messages_empty_context() {
        let messages = build_chat_messages(&[], &VecDeque::new(), "anything?");

        assert_eq!(messages.len(), 2);
        assert!(messages[0].content.contains("No relevant content"));
    }

    #[test]
    fn test_history_is_bounded() {
        let config = crate::config::Config::default();
        let mut chat = RagChat::new(&config);
        let max = chat.max_history_turns;

        for i in 0..(max + 5) {
            chat.push_turn(&format!("q{}", i), &format!("a{}", i));
        }

        assert_eq!(chat.history_len(), max);
        // Oldest turns were evicted first
        assert_eq!(chat.history.front().map(|(q, _)| q.as_str()), Some("q5"));
    }

    #[test]
    fn test_dedup_sources_keeps_first_per_item() {
        let hits = vec![
            hit("a", "Page A", 0.9),
            hit("a", "Page A", 0.8),
            hit("b", "Page B", 0.7),
        ];

        let sources = dedup_sources(&hits);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].title, "Page A");
        assert!((sources[0].score - 0.9).abs() < f32::EPSILON);
    }
}
