//! Payload schema for Qdrant points

use qdrant_client::qdrant::{PointStruct, Value as QdrantValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// A point ready to be upserted to Qdrant
#[derive(Debug, Clone)]
pub struct ChunkPoint {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

impl ChunkPoint {
    /// Convert to qdrant-client PointStruct
    pub fn to_point_struct(self) -> PointStruct {
        let payload_map = self.payload.to_qdrant_payload();
        PointStruct::new(self.id.to_string(), self.vector, payload_map)
    }
}

/// Payload stored with each chunk in Qdrant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkPayload {
    /// Content item ID (stable per source)
    pub item_id: String,

    /// Item URL, if the item came from the web
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Item title
    pub title: String,

    /// Content type ("web_page", "text_document")
    pub content_type: String,

    /// Chunk index within the item
    pub chunk_index: i32,

    /// Hash of the chunk content
    pub chunk_hash: String,

    /// When this chunk was last updated
    pub updated_at: String,
}

impl ChunkPayload {
    pub fn new(
        item_id: String,
        url: Option<String>,
        title: String,
        content_type: String,
        chunk_index: i32,
        chunk_hash: String,
        updated_at: String,
    ) -> Self {
        Self {
            item_id,
            url,
            title,
            content_type,
            chunk_index,
            chunk_hash,
            updated_at,
        }
    }

    /// Convert to Qdrant payload format
    pub fn to_qdrant_payload(self) -> HashMap<String, QdrantValue> {
        let mut map = HashMap::new();

        map.insert("item_id".to_string(), string_to_qdrant(&self.item_id));
        map.insert("title".to_string(), string_to_qdrant(&self.title));
        map.insert(
            "content_type".to_string(),
            string_to_qdrant(&self.content_type),
        );
        map.insert(
            "chunk_index".to_string(),
            int_to_qdrant(self.chunk_index as i64),
        );
        map.insert("chunk_hash".to_string(), string_to_qdrant(&self.chunk_hash));
        map.insert("updated_at".to_string(), string_to_qdrant(&self.updated_at));

        if let Some(ref url) = self.url {
            map.insert("url".to_string(), string_to_qdrant(url));
        }

        map
    }
}

fn string_to_qdrant(s: &str) -> QdrantValue {
    QdrantValue {
        kind: Some(qdrant_client::qdrant::value::Kind::StringValue(
            s.to_string(),
        )),
    }
}

fn int_to_qdrant(i: i64) -> QdrantValue {
    QdrantValue {
        kind: Some(qdrant_client::qdrant::value::Kind::IntegerValue(i)),
    }
}

impl From<Map<String, Value>> for ChunkPayload {
    fn from(map: Map<String, Value>) -> Self {
        serde_json::from_value(Value::Object(map)).unwrap_or_else(|_| ChunkPayload {
            item_id: String::new(),
            url: None,
            title: String::new(),
            content_type: String::new(),
            chunk_index: 0,
            chunk_hash: String::new(),
            updated_at: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_serialization() {
        let payload = ChunkPayload::new(
            "item-123".to_string(),
            Some("https://example.com/article".to_string()),
            "Example Article".to_string(),
            "web_page".to_string(),
            0,
            "hash123".to_string(),
            "2024-01-01T00:00:00Z".to_string(),
        );

        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("item_id"));
        assert!(json.contains("item-123"));

        let parsed: ChunkPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.item_id, "item-123");
        assert_eq!(parsed.url.as_deref(), Some("https://example.com/article"));
    }

    #[test]
    fn test_payload_roundtrip_through_qdrant_map() {
        let payload = ChunkPayload::new(
            "item-9".to_string(),
            None,
            "Pasted Note".to_string(),
            "text_document".to_string(),
            2,
            "abc".to_string(),
            "2024-06-01T00:00:00Z".to_string(),
        );

        let map = payload.clone().to_qdrant_payload();
        assert!(map.contains_key("item_id"));
        // No url key for pasted text
        assert!(!map.contains_key("url"));
        assert_eq!(map.len(), 6);
    }
}
