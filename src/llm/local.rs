// Adapter for a locally hosted model behind an OpenAI-compatible API.
// Reference deployment: Ollama at http://localhost:11434/v1 serving llama3.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::llm::provider::QueryAdapter;
use crate::types::{AppError, AppResult};

pub struct LocalAdapter {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ApiMessage>,
    stream: bool,
}

#[derive(Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

impl LocalAdapter {
    pub fn new(config: &LlmConfig) -> AppResult<Self> {
        // Model calls are unbounded in latency; the explicit timeout is the
        // only cancellation this layer has.
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl QueryAdapter for LocalAdapter {
    async fn complete(&self, system: &str, prompt: &str) -> AppResult<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ApiMessage { role: "system".to_string(), content: system.to_string() },
                ApiMessage { role: "user".to_string(), content: prompt.to_string() },
            ],
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Query(format!("model endpoint unreachable: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Query(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AppError::Query(format!("model returned {}: {}", status, message)));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::Query(format!("malformed model response: {}", e)))?;

        let content = parsed
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter_for(url: &str) -> LocalAdapter {
        LocalAdapter::new(&LlmConfig {
            base_url: url.to_string(),
            model: "llama3".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_complete_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices":[{"message":{"role":"assistant","content":"1234"}}]}"#,
            )
            .create_async()
            .await;

        let adapter = adapter_for(&server.url());
        let answer = adapter
            .complete("you are a data analyst", "What is the total sales?")
            .await
            .unwrap();
        assert_eq!(answer, "1234");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_error_body_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(404)
            .with_body(r#"{"error":{"message":"model 'llama3' not found"}}"#)
            .create_async()
            .await;

        let adapter = adapter_for(&server.url());
        let err = adapter.complete("sys", "prompt").await.unwrap_err();
        match err {
            AppError::Query(message) => assert!(message.contains("model 'llama3' not found")),
            other => panic!("expected Query error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connectivity_failure_is_query_error() {
        // Nothing listens on this port.
        let adapter = adapter_for("http://127.0.0.1:1");
        let err = adapter.complete("sys", "prompt").await.unwrap_err();
        assert!(matches!(err, AppError::Query(_)));
    }

    #[tokio::test]
    async fn test_empty_choices_yield_empty_answer() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let adapter = adapter_for(&server.url());
        let answer = adapter.complete("sys", "prompt").await.unwrap();
        assert_eq!(answer, "");
    }
}
