//! HTML parsing and text extraction

use super::{normalize_whitespace, ExtractedContent, ExtractedLink};
use crate::error::Result;
use scraper::{Html, Selector};
use url::Url;

/// Parse HTML content, extracting title, readable text and links
pub fn parse_html(content: &str, base_url: Option<&str>) -> Result<ExtractedContent> {
    let document = Html::parse_document(content);
    let mut doc = ExtractedContent::new(String::new());

    // Extract title
    if let Ok(selector) = Selector::parse("title") {
        if let Some(title_elem) = document.select(&selector).next() {
            let title = title_elem.text().collect::<String>().trim().to_string();
            if !title.is_empty() {
                doc.title = Some(title);
            }
        }
    }

    // Restrict extraction to <body> when present; script/style content is
    // dropped by html2text
    let body_selector = Selector::parse("body").ok();
    let root = body_selector
        .as_ref()
        .and_then(|s| document.select(s).next())
        .map(|e| e.html())
        .unwrap_or_else(|| content.to_string());

    let text = html2text::from_read(root.as_bytes(), 80).unwrap_or_else(|_| root.clone());
    doc.text = normalize_whitespace(&text);

    // Extract links
    if let Ok(selector) = Selector::parse("a[href]") {
        let base = base_url.and_then(|u| Url::parse(u).ok());

        for elem in document.select(&selector) {
            if let Some(href) = elem.value().attr("href") {
                let link_text = elem.text().collect::<String>().trim().to_string();
                let link_text = if link_text.is_empty() {
                    None
                } else {
                    Some(link_text)
                };

                // Resolve relative URLs
                let url = if let Some(ref base) = base {
                    base.join(href)
                        .map(|u| u.to_string())
                        .unwrap_or_else(|_| href.to_string())
                } else {
                    href.to_string()
                };

                // Determine if internal
                let is_internal = if let Some(ref base) = base {
                    if let Ok(link_url) = Url::parse(&url) {
                        link_url.host() == base.host()
                    } else {
                        href.starts_with('/') || href.starts_with('#') || !href.contains("://")
                    }
                } else {
                    !href.contains("://")
                };

                doc.links.push(ExtractedLink {
                    url,
                    text: link_text,
                    is_internal,
                });
            }
        }
    }

    Ok(doc)
}

/// Extract just the text content from HTML (simpler version)
pub fn extract_text_from_html(content: &str) -> String {
    let text = html2text::from_read(content.as_bytes(), 80).unwrap_or_else(|_| content.to_string());
    normalize_whitespace(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_html_basic() {
        let html = r#"
        <!DOCTYPE html>
        <html>
        <head><title>Test Page</title></head>
        <body>
            <h1>Main Heading</h1>
            <p>Some paragraph text here.</p>
            <a href="/other">Link</a>
        </body>
        </html>
        "#;

        let doc = parse_html(html, Some("https://example.com")).unwrap();

        assert_eq!(doc.title, Some("Test Page".to_string()));
        assert!(doc.text.contains("Main Heading"));
        assert!(doc.text.contains("paragraph text"));
    }

    #[test]
    fn test_link_extraction() {
        let html = r#"
        <html>
        <body>
            <a href="/internal">Internal</a>
            <a href="https://external.com/page">External</a>
            <a href="relative/path">Relative</a>
        </body>
        </html>
        "#;

        let doc = parse_html(html, Some("https://example.com")).unwrap();

        assert_eq!(doc.links.len(), 3);
        assert!(doc.links[0].is_internal);
        assert!(!doc.links[1].is_internal);
        assert_eq!(doc.links[0].url, "https://example.com/internal");
    }

    #[test]
    fn test_extract_text_simple() {
        let html = "<html><body><p>Hello <strong>world</strong>!</p></body></html>";
        let text = extract_text_from_html(html);
        assert!(text.contains("Hello"));
        assert!(text.contains("world"));
    }

    #[test]
    fn test_missing_title_is_none() {
        let html = "<html><body><p>No title here</p></body></html>";
        let doc = parse_html(html, None).unwrap();
        assert!(doc.title.is_none());
    }
}
