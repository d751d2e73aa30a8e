//! Remove command implementation

use crate::error::{Error, Result};
use crate::meta::MetaDb;
use crate::store::QdrantStore;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Result of removing one item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveStats {
    pub item_id: String,
    pub title: String,
    pub chunks_removed: usize,
}

/// Remove an item and all its chunks from both stores.
/// Accepts an item ID or the exact URL it was added from.
pub async fn cmd_remove(
    db: &MetaDb,
    store: &QdrantStore,
    id_or_url: &str,
) -> Result<RemoveStats> {
    let item = match db.get_item(id_or_url).await? {
        Some(item) => item,
        None => db
            .get_item_by_url(id_or_url)
            .await?
            .ok_or_else(|| Error::ItemNotFound(id_or_url.to_string()))?,
    };

    info!("Removing item {} ({})", item.id, item.title);

    let point_ids = db.delete_item(&item.id).await?;
    let uuids: Vec<Uuid> = point_ids
        .iter()
        .filter_map(|s| Uuid::parse_str(s).ok())
        .collect();
    store.delete_points(&uuids).await?;

    Ok(RemoveStats {
        item_id: item.id,
        title: item.title,
        chunks_removed: point_ids.len(),
    })
}

/// Print removal confirmation
pub fn print_remove_stats(stats: &RemoveStats) {
    println!("✓ Removed: {}", stats.title);
    println!("  ID: {}", stats.item_id);
    println!("  Chunks removed: {}", stats.chunks_removed);
}
