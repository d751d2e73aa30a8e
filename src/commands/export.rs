//! Export command implementation

use crate::commands::list::{cmd_list, ItemInfo};
use crate::error::Result;
use crate::meta::MetaDb;
use clap::ValueEnum;
use std::path::Path;
use tracing::info;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

/// Render the whole library in the requested format
pub async fn cmd_export(db: &MetaDb, format: ExportFormat) -> Result<String> {
    let items = cmd_list(db).await?;
    info!("Exporting {} items as {:?}", items.len(), format);

    match format {
        ExportFormat::Csv => Ok(render_csv(&items)),
        ExportFormat::Json => Ok(serde_json::to_string_pretty(&items)?),
    }
}

/// Write exported content to a file or stdout
pub fn write_export(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)?;
            println!("✓ Exported to {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn render_csv(items: &[ItemInfo]) -> String {
    let mut out = String::from(
        "id,title,url,content_type,word_count,chunk_count,summary,fetched_at\n",
    );

    for item in items {
        let fields = [
            item.id.as_str(),
            item.title.as_str(),
            item.url.as_deref().unwrap_or(""),
            item.content_type.as_str(),
            &item.word_count.to_string(),
            &item.chunk_count.to_string(),
            item.summary.as_deref().unwrap_or(""),
            item.fetched_at.as_str(),
        ];
        let row: Vec<String> = fields.iter().map(|f| csv_escape(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

/// Quote a CSV field per RFC 4180: wrap in double quotes when the value
/// contains a comma, quote or newline, doubling embedded quotes.
fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, summary: Option<&str>) -> ItemInfo {
        ItemInfo {
            id: "abc123".to_string(),
            title: title.to_string(),
            url: Some("https://example.com".to_string()),
            content_type: "web_page".to_string(),
            word_count: 42,
            chunk_count: 2,
            summary: summary.map(|s| s.to_string()),
            fetched_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_csv_escape_plain() {
        assert_eq!(csv_escape("plain text"), "plain text");
    }

    #[test]
    fn test_csv_escape_special() {
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("line1\nline2"), "\"line1\nline2\"");
    }

    #[test]
    fn test_render_csv_header_and_rows() {
        let items = vec![item("Title, with comma", Some("A summary"))];
        let csv = render_csv(&items);
        let mut lines = csv.lines();

        assert_eq!(
            lines.next(),
            Some("id,title,url,content_type,word_count,chunk_count,summary,fetched_at")
        );
        let row = lines.next().expect("one data row");
        assert!(row.starts_with("abc123,\"Title, with comma\","));
        assert!(row.contains("web_page,42,2,A summary"));
    }

    #[test]
    fn test_render_csv_empty_optionals() {
        let mut it = item("Plain", None);
        it.url = None;
        let csv = render_csv(&[it]);
        let row = csv.lines().nth(1).expect("one data row");

        assert_eq!(row, "abc123,Plain,,web_page,42,2,,2024-01-01T00:00:00Z");
    }
}
