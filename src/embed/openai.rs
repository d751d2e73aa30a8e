//! OpenAI-compatible embedding backend

use super::Embedder;
use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum EmbeddingResponse {
    Data { data: Vec<EmbeddingData> },
    Embeddings { embeddings: Vec<Vec<f32>> },
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl EmbeddingResponse {
    fn into_embeddings(self) -> Vec<Vec<f32>> {
        match self {
            EmbeddingResponse::Data { data } => data.into_iter().map(|d| d.embedding).collect(),
            EmbeddingResponse::Embeddings { embeddings } => embeddings,
        }
    }
}

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint
pub struct OpenAiEmbedder {
    client: Client,
    base_url: Url,
    api_key: String,
    model: String,
    dimension: usize,
    retries: usize,
}

impl OpenAiEmbedder {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.api_key()?;
        Self::with_params(
            &config.openai.api_base,
            api_key,
            &config.openai.embedding_model,
            config.embedding.dimension,
            config.openai.request_timeout_secs,
        )
    }

    pub fn with_params(
        api_base: &str,
        api_key: String,
        model: &str,
        dimension: usize,
        timeout_secs: u64,
    ) -> Result<Self> {
        let base_url = Url::parse(&ensure_trailing_slash(api_base))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
            model: model.to_string(),
            dimension,
            retries: 2,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid API base URL: {}", e)))
    }

    async fn send_with_retry<T: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let mut last_err: Option<Error> = None;
        for attempt in 0..=self.retries {
            let req = request
                .try_clone()
                .ok_or_else(|| Error::Embedding("Failed to clone backend request".to_string()))?;
            match req.send().await {
                Ok(response) => match response.error_for_status() {
                    Ok(ok) => return Ok(ok.json::<T>().await?),
                    Err(e) => last_err = Some(Error::Embedding(e.to_string())),
                },
                Err(e) => last_err = Some(Error::Embedding(e.to_string())),
            }

            if attempt < self.retries {
                tokio::time::sleep(Duration::from_millis(200 * (attempt + 1) as u64)).await;
            }
        }

        Err(last_err
            .unwrap_or_else(|| Error::Embedding("Embedding request failed".to_string())))
    }

    fn validate_dimensions(&self, embeddings: &[Vec<f32>]) -> Result<()> {
        if let Some(mismatch) = embeddings.iter().find(|vec| vec.len() != self.dimension) {
            return Err(Error::Embedding(format!(
                "Embedding dimension mismatch for model '{}': expected {}, got {}",
                self.model,
                self.dimension,
                mismatch.len()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let expected = texts.len();
        let url = self.endpoint("embeddings")?;
        let body = EmbeddingRequest {
            model: self.model.clone(),
            input: texts,
        };
        let request = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body);

        let parsed: EmbeddingResponse = self.send_with_retry(request).await?;
        let embeddings = parsed.into_embeddings();

        if embeddings.len() != expected {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                expected,
                embeddings.len()
            )));
        }

        self.validate_dimensions(&embeddings)?;
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn ensure_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_embedder(base: &str, dimension: usize) -> OpenAiEmbedder {
        OpenAiEmbedder::with_params(base, "test-key".to_string(), "test-model", dimension, 5)
            .unwrap()
    }

    #[tokio::test]
    async fn test_embed_parses_openai_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "data": [
                    {"object": "embedding", "index": 0, "embedding": [0.1, 0.2, 0.3]},
                    {"object": "embedding", "index": 1, "embedding": [0.4, 0.5, 0.6]}
                ],
                "model": "test-model"
            })))
            .mount(&server)
            .await;

        let embedder = test_embedder(&format!("{}/v1", server.uri()), 3);
        let embeddings = embedder
            .embed(vec!["first".to_string(), "second".to_string()])
            .await
            .unwrap();

        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0], vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_embed_rejects_dimension_mismatch() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"embedding": [0.1, 0.2]}]
            })))
            .mount(&server)
            .await;

        let embedder = test_embedder(&format!("{}/v1", server.uri()), 3);
        let err = embedder
            .embed(vec!["text".to_string()])
            .await
            .expect_err("should reject wrong dimension");

        match err {
            Error::Embedding(message) => assert!(message.contains("dimension mismatch")),
            other => panic!("expected embedding error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_embed_retries_then_fails() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3) // initial attempt + 2 retries
            .mount(&server)
            .await;

        let embedder = test_embedder(&format!("{}/v1", server.uri()), 3);
        let result = embedder.embed(vec!["text".to_string()]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_empty_input_short_circuits() {
        let embedder = test_embedder("http://127.0.0.1:1/v1", 3);
        let embeddings = embedder.embed(Vec::new()).await.unwrap();
        assert!(embeddings.is_empty());
    }
}
