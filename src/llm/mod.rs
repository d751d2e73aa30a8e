//! OpenAI-compatible chat completions client
//!
//! Shared by summary generation, RAG chat and library analysis.

use crate::config::Config;
use crate::error::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// A chat message with role ("system", "user" or "assistant")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint
pub struct LlmClient {
    client: Client,
    base_url: Url,
    api_key: String,
    model: String,
    retries: usize,
}

impl LlmClient {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.api_key()?;
        Self::with_params(
            &config.openai.api_base,
            api_key,
            &config.openai.chat_model,
            config.openai.request_timeout_secs,
        )
    }

    pub fn with_params(
        api_base: &str,
        api_key: String,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self> {
        let base = if api_base.ends_with('/') {
            api_base.to_string()
        } else {
            format!("{}/", api_base)
        };
        let base_url = Url::parse(&base)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
            model: model.to_string(),
            retries: 2,
        })
    }

    /// Get the model name
    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// Run a chat completion and return the assistant's reply text
    pub async fn complete(&self, messages: Vec<ChatMessage>, temperature: f32) -> Result<String> {
        let url = self
            .base_url
            .join("chat/completions")
            .map_err(|e| Error::Config(format!("Invalid API base URL: {}", e)))?;

        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature,
        };
        let request = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body);

        let response: ChatCompletionResponse = self.send_with_retry(request).await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| Error::Llm("Chat completion returned no choices".to_string()))
    }

    async fn send_with_retry<T: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let mut last_err: Option<Error> = None;
        for attempt in 0..=self.retries {
            let req = request
                .try_clone()
                .ok_or_else(|| Error::Llm("Failed to clone chat request".to_string()))?;
            match req.send().await {
                Ok(response) => match response.error_for_status() {
                    Ok(ok) => return Ok(ok.json::<T>().await?),
                    Err(e) => last_err = Some(Error::Llm(e.to_string())),
                },
                Err(e) => last_err = Some(Error::Llm(e.to_string())),
            }

            if attempt < self.retries {
                tokio::time::sleep(Duration::from_millis(200 * (attempt + 1) as u64)).await;
            }
        }

        Err(last_err.unwrap_or_else(|| Error::Llm("Chat completion request failed".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base: &str) -> LlmClient {
        LlmClient::with_params(base, "test-key".to_string(), "test-model", 5).unwrap()
    }

    #[tokio::test]
    async fn test_complete_returns_assistant_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-1",
                "choices": [
                    {
                        "index": 0,
                        "message": {"role": "assistant", "content": "  A concise answer.  "},
                        "finish_reason": "stop"
                    }
                ]
            })))
            .mount(&server)
            .await;

        let client = test_client(&format!("{}/v1", server.uri()));
        let answer = client
            .complete(vec![ChatMessage::user("question")], 0.7)
            .await
            .unwrap();

        assert_eq!(answer, "A concise answer.");
    }

    #[tokio::test]
    async fn test_complete_no_choices_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let client = test_client(&format!("{}/v1", server.uri()));
        let err = client
            .complete(vec![ChatMessage::user("question")], 0.7)
            .await
            .expect_err("empty choices should fail");

        assert!(matches!(err, Error::Llm(_)));
    }

    #[test]
    fn test_message_constructors() {
        assert_eq!(ChatMessage::system("a").role, "system");
        assert_eq!(ChatMessage::user("b").role, "user");
        assert_eq!(ChatMessage::assistant("c").role, "assistant");
    }
}
