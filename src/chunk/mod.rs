//! Deterministic text chunking
//!
//! Splits extracted text into overlapping chunks while:
//! - Preferring paragraph and sentence boundaries
//! - Staying on valid UTF-8 character boundaries
//! - Producing stable, deterministic output and content hashes

use crate::config::ChunkConfig;
use crate::error::Result;
use blake3::Hasher;

/// Priority levels for break points
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BreakPriority {
    /// Word boundary (lowest)
    Word = 1,
    /// Sentence boundary
    Sentence = 2,
    /// Paragraph boundary (highest)
    Paragraph = 3,
}

/// A potential break point in text
#[derive(Debug, Clone)]
pub struct BreakPoint {
    /// Byte position
    pub position: usize,
    /// Priority of this break point
    pub priority: BreakPriority,
}

/// A text chunk with metadata
#[derive(Debug, Clone)]
pub struct TextChunk {
    /// The actual text content
    pub text: String,

    /// Character start position in original document
    pub char_start: usize,

    /// Character end position in original document
    pub char_end: usize,

    /// Chunk index (0-based)
    pub index: usize,

    /// Blake3 hash of the chunk text, salted with the document hash
    pub hash: String,
}

impl TextChunk {
    /// Compute the hash for this chunk
    pub fn compute_hash(text: &str, doc_hash: &str) -> String {
        let mut hasher = Hasher::new();
        hasher.update(doc_hash.as_bytes());
        hasher.update(text.as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

/// Chunk extracted text into overlapping windows
pub fn chunk_text(text: &str, doc_hash: &str, config: &ChunkConfig) -> Result<Vec<TextChunk>> {
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let break_points = find_break_points(text);

    let mut chunks = Vec::new();
    let mut current_start = 0;
    let mut chunk_index = 0;

    while current_start < text.len() {
        current_start = ensure_char_boundary(text, current_start);
        if current_start >= text.len() {
            break;
        }

        let target_end = current_start + config.max_chars;

        let chunk_end = if target_end >= text.len() {
            text.len()
        } else {
            find_best_break(text, current_start, target_end, &break_points, config)
        };

        let chunk_end = ensure_char_boundary(text, chunk_end);
        if chunk_end <= current_start {
            current_start = chunk_end + 1;
            continue;
        }

        let chunk_text = text[current_start..chunk_end].trim().to_string();

        // Skip if too small (unless it's the last chunk)
        if chunk_text.len() < config.min_chars && chunk_end < text.len() {
            current_start = chunk_end;
            continue;
        }

        if !chunk_text.is_empty() {
            let hash = TextChunk::compute_hash(&chunk_text, doc_hash);

            chunks.push(TextChunk {
                text: chunk_text,
                char_start: current_start,
                char_end: chunk_end,
                index: chunk_index,
                hash,
            });

            chunk_index += 1;
        }

        if chunk_end >= text.len() {
            break;
        }

        // Step back by the overlap, staying on a char boundary
        let mut next_start = if chunk_end > config.overlap_chars {
            ensure_char_boundary(text, chunk_end - config.overlap_chars)
        } else {
            chunk_end
        };

        // A large overlap can reach back to or before this chunk's start
        // when the break lands early. Bound the overlap by the chunk itself
        // so the scan always advances.
        if next_start <= current_start {
            let midpoint =
                ensure_char_boundary(text, current_start + (chunk_end - current_start) / 2);
            next_start = if midpoint > current_start {
                midpoint
            } else {
                chunk_end
            };
        }

        current_start = next_start;
    }

    Ok(chunks)
}

/// Find potential break points in the text
fn find_break_points(text: &str) -> Vec<BreakPoint> {
    let mut points = Vec::new();

    // Paragraph breaks (double newlines)
    for (i, c) in text.char_indices() {
        if c == '\n' {
            let remaining = &text[i..];
            if remaining.starts_with("\n\n") {
                let pos = i + 2;
                if text.is_char_boundary(pos) {
                    points.push(BreakPoint {
                        position: pos,
                        priority: BreakPriority::Paragraph,
                    });
                }
            }
        }
    }

    // Sentence boundaries
    for pat in [". ", ".\n", "? ", "! "] {
        for (i, _) in text.match_indices(pat) {
            let pos = i + 2;
            if pos <= text.len() && text.is_char_boundary(pos) {
                points.push(BreakPoint {
                    position: pos,
                    priority: BreakPriority::Sentence,
                });
            }
        }
    }

    points.sort_by_key(|p| p.position);
    points.dedup_by_key(|p| p.position);

    points
}

/// Ensure a position is on a valid UTF-8 character boundary
fn ensure_char_boundary(text: &str, pos: usize) -> usize {
    if pos >= text.len() {
        return text.len();
    }
    if text.is_char_boundary(pos) {
        return pos;
    }
    let mut adjusted = pos;
    while adjusted > 0 && !text.is_char_boundary(adjusted) {
        adjusted -= 1;
    }
    adjusted
}

/// Find the best break point near the target position
fn find_best_break(
    text: &str,
    start: usize,
    target: usize,
    break_points: &[BreakPoint],
    config: &ChunkConfig,
) -> usize {
    // Search window: 80% to 120% of target chunk size
    let min_pos = ensure_char_boundary(text, start + (config.max_chars * 4 / 5));
    let max_pos = ensure_char_boundary(
        text,
        std::cmp::min(start + (config.max_chars * 6 / 5), text.len()),
    );

    let candidates: Vec<&BreakPoint> = break_points
        .iter()
        .filter(|p| {
            p.position >= min_pos && p.position <= max_pos && text.is_char_boundary(p.position)
        })
        .collect();

    if let Some(best) = candidates.iter().max_by_key(|p| p.priority as u8) {
        return best.position;
    }

    // Fall back to word boundary near the target
    if target < text.len() {
        let search_start =
            ensure_char_boundary(text, if target > 50 { target - 50 } else { start });
        let search_end = ensure_char_boundary(text, std::cmp::min(target + 50, text.len()));

        if search_start < search_end {
            let search_text = &text[search_start..search_end];

            for (i, _) in search_text.rmatch_indices(' ') {
                let pos = search_start + i + 1;
                if pos >= min_pos && pos <= max_pos && text.is_char_boundary(pos) {
                    return pos;
                }
            }
        }
    }

    ensure_char_boundary(text, std::cmp::min(target, text.len()))
}

/// Compute a stable hash for document content
pub fn compute_content_hash(content: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(content);
    hasher.finalize().to_hex().to_string()
}

/// Compute a stable hash for a string
pub fn compute_text_hash(text: &str) -> String {
    compute_content_hash(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_chunk_config() -> ChunkConfig {
        ChunkConfig {
            max_chars: 500,
            overlap_chars: 50,
            min_chars: 50,
        }
    }

    #[test]
    fn test_chunk_short_document() {
        let text = "This is a short document.";
        let config = default_chunk_config();
        let doc_hash = compute_text_hash(text);

        let chunks = chunk_text(text, &doc_hash, &config).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "This is a short document.");
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn test_chunk_long_document() {
        let text = "Lorem ipsum dolor sit amet. ".repeat(100);
        let config = default_chunk_config();
        let doc_hash = compute_text_hash(&text);

        let chunks = chunk_text(&text, &doc_hash, &config).unwrap();

        assert!(chunks.len() > 1);
        // Chunks stay near the configured max (break window allows 120%)
        for chunk in &chunks {
            assert!(chunk.text.len() <= config.max_chars * 6 / 5);
        }
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let text = "First paragraph with some words.\n\nSecond paragraph. More sentences here! And a question? ".repeat(30);
        let config = default_chunk_config();
        let doc_hash = compute_text_hash(&text);

        let chunks1 = chunk_text(&text, &doc_hash, &config).unwrap();
        let chunks2 = chunk_text(&text, &doc_hash, &config).unwrap();

        assert_eq!(chunks1.len(), chunks2.len());
        for (a, b) in chunks1.iter().zip(chunks2.iter()) {
            assert_eq!(a.text, b.text);
            assert_eq!(a.char_start, b.char_start);
            assert_eq!(a.char_end, b.char_end);
            assert_eq!(a.hash, b.hash);
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let text = "word ".repeat(400);
        let config = default_chunk_config();
        let doc_hash = compute_text_hash(&text);

        let chunks = chunk_text(&text, &doc_hash, &config).unwrap();
        assert!(chunks.len() > 1);

        for pair in chunks.windows(2) {
            assert!(pair[1].char_start < pair[0].char_end);
        }
    }

    #[test]
    fn test_chunk_hash_stability() {
        let text = "Test content for hashing.";
        let config = default_chunk_config();
        let doc_hash = compute_text_hash(text);

        let chunks1 = chunk_text(text, &doc_hash, &config).unwrap();
        let chunks2 = chunk_text(text, &doc_hash, &config).unwrap();

        assert_eq!(chunks1[0].hash, chunks2[0].hash);
    }

    #[test]
    fn test_content_hash() {
        let hash1 = compute_text_hash("hello world");
        let hash2 = compute_text_hash("hello world");
        let hash3 = compute_text_hash("different content");

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
    }

    #[test]
    fn test_multibyte_text_is_boundary_safe() {
        let text = "日本語のテキストです。".repeat(200);
        let config = ChunkConfig {
            max_chars: 200,
            overlap_chars: 40,
            min_chars: 20,
        };
        let doc_hash = compute_text_hash(&text);

        // Must not panic on char boundaries
        let chunks = chunk_text(&text, &doc_hash, &config).unwrap();
        assert!(!chunks.is_empty());
    }

    #[test]
    fn test_large_overlap_still_advances() {
        // Overlap close to the chunk size, with paragraph breaks landing
        // before the overlap can step past the previous chunk start.
        let paragraph = "word ".repeat(170);
        let text = format!("{}\n\n", paragraph.trim_end()).repeat(8);
        let config = ChunkConfig {
            max_chars: 1000,
            overlap_chars: 900,
            min_chars: 50,
        };
        let doc_hash = compute_text_hash(&text);

        let chunks = chunk_text(&text, &doc_hash, &config).unwrap();

        assert!(!chunks.is_empty());
        for pair in chunks.windows(2) {
            assert!(pair[1].char_start > pair[0].char_start);
        }
        assert!(chunks.len() <= text.len());
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        let config = default_chunk_config();
        let chunks = chunk_text("", "hash", &config).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_break_priority_ordering() {
        assert!(BreakPriority::Paragraph > BreakPriority::Sentence);
        assert!(BreakPriority::Sentence > BreakPriority::Word);
    }
}
