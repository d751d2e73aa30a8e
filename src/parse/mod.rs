//! Content parsing and text extraction
//!
//! This module handles:
//! - HTML parsing and text extraction
//! - Plain text normalization
//! - Word counting and content capping

mod html;

pub use html::*;

use unicode_segmentation::UnicodeSegmentation;

/// Extracted content ready for ingestion
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    /// Extracted title (if found)
    pub title: Option<String>,

    /// Main text content
    pub text: String,

    /// Links found in the document
    pub links: Vec<ExtractedLink>,
}

/// An extracted link
#[derive(Debug, Clone)]
pub struct ExtractedLink {
    /// Link URL (resolved against the page URL)
    pub url: String,

    /// Link text
    pub text: Option<String>,

    /// Whether this links within the same host
    pub is_internal: bool,
}

impl ExtractedContent {
    pub fn new(text: String) -> Self {
        Self {
            title: None,
            text,
            links: Vec::new(),
        }
    }
}

/// Prepare pasted plain text for ingestion
pub fn parse_plain_text(content: &str) -> ExtractedContent {
    ExtractedContent::new(normalize_whitespace(content))
}

/// Count words using Unicode word boundaries
pub fn count_words(text: &str) -> usize {
    text.unicode_words().count()
}

/// Truncate text to at most `max_chars` characters, on a char boundary
pub fn cap_content(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last_was_whitespace = true;
    let mut newline_count = 0;

    for c in text.chars() {
        if c.is_whitespace() {
            if c == '\n' {
                newline_count += 1;
            }
            last_was_whitespace = true;
        } else {
            // Before adding a non-whitespace char, handle accumulated whitespace
            if last_was_whitespace && !result.is_empty() {
                if newline_count >= 2 {
                    // Multiple newlines = paragraph break, preserve as double newline
                    result.push_str("\n\n");
                } else if newline_count == 1 {
                    // Single newline = line break
                    result.push('\n');
                } else {
                    // Other whitespace = single space
                    result.push(' ');
                }
            }
            newline_count = 0;
            result.push(c);
            last_was_whitespace = false;
        }
    }

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        let input = "Hello   world\n\n\n\ntest";
        let result = normalize_whitespace(input);
        assert_eq!(result, "Hello world\n\ntest");
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words("Hello, world! This is a test."), 6);
        assert_eq!(count_words(""), 0);
    }

    #[test]
    fn test_cap_content_char_boundary() {
        let text = "héllo wörld";
        let capped = cap_content(text, 5);
        assert_eq!(capped, "héllo");

        // Shorter than the cap: unchanged
        assert_eq!(cap_content("short", 100), "short");
    }

    #[test]
    fn test_parse_plain_text() {
        let doc = parse_plain_text("  Some   pasted\n\n\ntext  ");
        assert_eq!(doc.text, "Some pasted\n\ntext");
        assert!(doc.title.is_none());
        assert!(doc.links.is_empty());
    }
}
