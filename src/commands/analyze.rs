//! Analyze command implementation

use crate::analyze::{analyze_library, generate_tags, ItemTags, LibraryAnalysis};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::llm::LlmClient;
use crate::meta::MetaDb;
use crate::progress::spinner;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Full analysis report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub analysis: LibraryAnalysis,
    pub tags: Option<Vec<ItemTags>>,
}

/// Analyze the library with the LLM, optionally generating per-item tags
pub async fn cmd_analyze(
    config: &Config,
    db: &MetaDb,
    llm: &LlmClient,
    with_tags: bool,
) -> Result<AnalysisReport> {
    let items = db.list_items().await?;
    if items.is_empty() {
        return Err(Error::Other(
            "Library is empty. Add content before running analysis.".to_string(),
        ));
    }

    let stats = db.get_global_stats().await?;
    info!("Analyzing {} items", items.len());

    let bar = spinner("Analyzing library");
    let analysis = analyze_library(&items, &stats, llm, config.chat.temperature).await;
    bar.finish_and_clear();
    let analysis = analysis?;

    let tags = if with_tags {
        let bar = spinner("Generating tags");
        let tags = generate_tags(&items, llm, config.chat.temperature).await;
        bar.finish_and_clear();
        Some(tags?)
    } else {
        None
    };

    Ok(AnalysisReport { analysis, tags })
}

/// Print the analysis report to console
pub fn print_analysis(report: &AnalysisReport) {
    println!("\n📈 Library Analysis\n");
    println!("Overview:");
    println!("{}\n", report.analysis.overview);
    println!("Trends:");
    println!("{}\n", report.analysis.trends);
    println!("Suggestions:");
    println!("{}", report.analysis.strategy);

    if let Some(tags) = &report.tags {
        println!("\n🏷  Tags\n");
        for item in tags {
            if item.tags.is_empty() {
                println!("  {}: (no tags)", item.title);
            } else {
                println!("  {}: {}", item.title, item.tags.join(", "));
            }
        }
    }
}
