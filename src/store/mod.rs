//! Qdrant vector database integration
//!
//! This module wraps the Qdrant client and provides:
//! - Collection management
//! - Point upsert/delete operations
//! - Vector search

mod payload;

pub use payload::*;

use crate::config::Config;
use crate::error::{Error, Result};
use qdrant_client::qdrant::{
    CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointId, PointStruct,
    SearchPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

/// Information about a Qdrant collection
#[derive(Debug, Clone)]
pub struct CollectionInfo {
    pub points_count: u64,
    pub indexed_vectors_count: u64,
    pub status: String,
}

/// Qdrant store handle
pub struct QdrantStore {
    client: Qdrant,
    collection: String,
    dimension: usize,
}

impl QdrantStore {
    /// Connect to Qdrant using config
    pub async fn connect(config: &Config) -> Result<Self> {
        Self::new(
            &config.qdrant_url,
            &config.collection_name,
            config.embedding.dimension,
        )
        .await
    }

    /// Create a new store connection directly with URL and collection name
    pub async fn new(url: &str, collection: &str, dimension: usize) -> Result<Self> {
        debug!("Connecting to Qdrant at {}", url);

        let client = Qdrant::from_url(url)
            .skip_compatibility_check()
            .build()
            .map_err(|e| Error::Qdrant(e.to_string()))?;

        Ok(Self {
            client,
            collection: collection.to_string(),
            dimension,
        })
    }

    /// Get the expected vector dimension for this store
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Ensure the collection exists with correct configuration
    pub async fn ensure_collection(&self) -> Result<()> {
        let exists = self.client.collection_exists(&self.collection).await?;

        if exists {
            debug!("Collection {} already exists", self.collection);

            if let Some(size) = self.collection_vector_size().await? {
                if size != self.dimension {
                    return Err(Error::Qdrant(format!(
                        "Collection '{}' has vector size {}, but the configured embedding dimension is {}. Use a new collection name or reset the collection.",
                        self.collection, size, self.dimension
                    )));
                }
            }

            return Ok(());
        }

        info!(
            "Creating collection {} with dimension {}",
            self.collection, self.dimension
        );

        let vectors_config = VectorParamsBuilder::new(self.dimension as u64, Distance::Cosine);

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection).vectors_config(vectors_config),
            )
            .await?;

        info!("Collection {} created successfully", self.collection);
        Ok(())
    }

    /// Check if the collection exists
    pub async fn collection_exists(&self) -> Result<bool> {
        let exists = self.client.collection_exists(&self.collection).await?;
        Ok(exists)
    }

    /// Delete the collection if it exists
    pub async fn delete_collection(&self) -> Result<bool> {
        let exists = self.client.collection_exists(&self.collection).await?;

        if !exists {
            return Ok(false);
        }

        info!("Deleting collection {}", self.collection);
        self.client.delete_collection(&self.collection).await?;
        Ok(true)
    }

    /// Reset the collection (delete and recreate)
    pub async fn reset_collection(&self) -> Result<()> {
        if self.client.collection_exists(&self.collection).await? {
            info!("Deleting existing collection {}", self.collection);
            self.client.delete_collection(&self.collection).await?;
        }

        self.ensure_collection().await?;
        Ok(())
    }

    /// Get collection info (point count, etc)
    pub async fn get_collection_info(&self) -> Result<Option<CollectionInfo>> {
        if !self.client.collection_exists(&self.collection).await? {
            return Ok(None);
        }

        let info = self.client.collection_info(&self.collection).await?;
        if let Some(result) = info.result {
            Ok(Some(CollectionInfo {
                points_count: result.points_count.unwrap_or(0),
                indexed_vectors_count: result.indexed_vectors_count.unwrap_or(0),
                status: format!("{:?}", result.status()),
            }))
        } else {
            Ok(None)
        }
    }

    /// Upsert ChunkPoint objects (converts to PointStruct internally)
    pub async fn upsert_points(&self, points: Vec<ChunkPoint>) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        if let Some(mismatch) = points.iter().find(|p| p.vector.len() != self.dimension) {
            return Err(Error::Qdrant(format!(
                "Vector dimension mismatch for collection '{}': expected {} (got {})",
                self.collection,
                self.dimension,
                mismatch.vector.len()
            )));
        }

        debug!(
            "Upserting {} points to collection {}",
            points.len(),
            self.collection
        );

        let point_structs: Vec<PointStruct> =
            points.into_iter().map(|p| p.to_point_struct()).collect();

        self.client
            .upsert_points(qdrant_client::qdrant::UpsertPointsBuilder::new(
                &self.collection,
                point_structs,
            ))
            .await?;

        Ok(())
    }

    /// Delete points by UUID
    pub async fn delete_points(&self, point_ids: &[Uuid]) -> Result<()> {
        if point_ids.is_empty() {
            return Ok(());
        }

        debug!(
            "Deleting {} points from collection {}",
            point_ids.len(),
            self.collection
        );

        let ids: Vec<PointId> = point_ids
            .iter()
            .map(|id| PointId::from(id.to_string()))
            .collect();

        self.client
            .delete_points(DeletePointsBuilder::new(&self.collection).points(ids))
            .await?;

        Ok(())
    }

    /// Search for similar vectors
    pub async fn search(
        &self,
        query_vector: Vec<f32>,
        limit: usize,
        filter: Option<SearchFilter>,
    ) -> Result<Vec<SearchResult>> {
        debug!(
            "Searching collection {} with limit {}",
            self.collection, limit
        );

        let mut search_builder =
            SearchPointsBuilder::new(&self.collection, query_vector, limit as u64)
                .with_payload(true);

        if let Some(f) = filter {
            if let Some(qdrant_filter) = f.to_qdrant_filter() {
                search_builder = search_builder.filter(qdrant_filter);
            }
        }

        let response = self.client.search_points(search_builder).await?;

        let results: Vec<SearchResult> = response
            .result
            .into_iter()
            .map(|p| {
                let payload: ChunkPayload = p
                    .payload
                    .into_iter()
                    .map(|(k, v)| (k, json_from_qdrant_value(v)))
                    .collect::<serde_json::Map<String, Value>>()
                    .into();

                SearchResult {
                    id: point_id_to_string(p.id),
                    score: p.score,
                    payload,
                }
            })
            .collect();

        Ok(results)
    }

    /// Get collection statistics
    pub async fn get_stats(&self) -> Result<CollectionStats> {
        let info = self.client.collection_info(&self.collection).await?;

        let points_count = info
            .result
            .map(|r| r.points_count.unwrap_or(0))
            .unwrap_or(0);

        Ok(CollectionStats {
            collection: self.collection.clone(),
            points_count: points_count as usize,
        })
    }

    async fn collection_vector_size(&self) -> Result<Option<usize>> {
        let info = self.client.collection_info(&self.collection).await?;
        let size = info
            .result
            .as_ref()
            .and_then(|r| r.config.as_ref())
            .and_then(|c| c.params.as_ref())
            .and_then(|p| p.vectors_config.as_ref())
            .and_then(|v| v.config.as_ref())
            .and_then(|c| match c {
                qdrant_client::qdrant::vectors_config::Config::Params(params) => {
                    Some(params.size as usize)
                }
                qdrant_client::qdrant::vectors_config::Config::ParamsMap(_) => None,
            });
        Ok(size)
    }
}

/// Search result
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub id: String,
    pub score: f32,
    pub payload: ChunkPayload,
}

/// Search filter options
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub item_ids: Option<Vec<String>>,
    pub content_types: Option<Vec<String>>,
}

impl SearchFilter {
    fn to_qdrant_filter(&self) -> Option<Filter> {
        use qdrant_client::qdrant::Condition;

        let mut must_conditions: Vec<Condition> = Vec::new();

        if let Some(ref item_ids) = self.item_ids {
            if item_ids.len() == 1 {
                must_conditions.push(Condition::matches("item_id", item_ids[0].clone()));
            }
        }

        if let Some(ref content_types) = self.content_types {
            if content_types.len() == 1 {
                must_conditions.push(Condition::matches(
                    "content_type",
                    content_types[0].clone(),
                ));
            }
        }

        if must_conditions.is_empty() {
            return None;
        }

        Some(Filter {
            must: must_conditions,
            should: vec![],
            must_not: vec![],
            min_should: None,
        })
    }
}

/// Collection statistics
#[derive(Debug, Clone)]
pub struct CollectionStats {
    pub collection: String,
    pub points_count: usize,
}

/// Convert PointId to string
fn point_id_to_string(id: Option<PointId>) -> String {
    match id {
        Some(PointId {
            point_id_options: Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(uuid)),
        }) => uuid,
        Some(PointId {
            point_id_options: Some(qdrant_client::qdrant::point_id::PointIdOptions::Num(num)),
        }) => num.to_string(),
        _ => String::new(),
    }
}

/// Convert Qdrant value to serde_json Value
fn json_from_qdrant_value(v: qdrant_client::qdrant::Value) -> Value {
    use qdrant_client::qdrant::value::Kind;

    match v.kind {
        Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::Number(i.into()),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(d)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => Value::Array(
            list.values
                .into_iter()
                .map(json_from_qdrant_value)
                .collect(),
        ),
        Some(Kind::StructValue(s)) => Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, json_from_qdrant_value(v)))
                .collect(),
        ),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use uuid::Uuid;

    #[test]
    fn test_search_filter_to_qdrant() {
        let filter = SearchFilter {
            item_ids: Some(vec!["item-1".to_string()]),
            content_types: Some(vec!["web_page".to_string()]),
        };

        let qdrant_filter = filter.to_qdrant_filter();
        assert!(qdrant_filter.is_some());
        assert_eq!(qdrant_filter.unwrap().must.len(), 2);
    }

    #[test]
    fn test_empty_filter_is_none() {
        let filter = SearchFilter::default();
        assert!(filter.to_qdrant_filter().is_none());
    }

    #[tokio::test]
    async fn test_upsert_points_rejects_dimension_mismatch() {
        let store = QdrantStore::new("http://127.0.0.1:6334", "test_collection", 3)
            .await
            .expect("store should initialize");

        let payload = ChunkPayload::new(
            "item-123".to_string(),
            Some("https://example.com".to_string()),
            "Example".to_string(),
            "web_page".to_string(),
            0,
            "hash123".to_string(),
            "2024-01-01T00:00:00Z".to_string(),
        );

        let point = ChunkPoint {
            id: Uuid::new_v4(),
            vector: vec![0.1, 0.2],
            payload,
        };

        let err = store
            .upsert_points(vec![point])
            .await
            .expect_err("should reject mismatched vector length");

        match err {
            Error::Qdrant(message) => assert!(message.contains("Vector dimension mismatch")),
            other => panic!("expected qdrant error, got {other:?}"),
        }
    }
}
