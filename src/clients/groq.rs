use crate::domain::model::RowOutcome;
use crate::domain::ports::AnswerProvider;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.groq.com";
const CHAT_COMPLETIONS_PATH: &str = "/openai/v1/chat/completions";
const DEFAULT_MODEL: &str = "llama3-8b-8192";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<AssistantMessage>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

pub struct GroqClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GroqClient {
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(EtlError::ApiError)?;

        Ok(Self {
            client,
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// 把整段 snippet 上下文原樣送出，不做長度裁切
    fn build_prompt(entity: &str, context: &str) -> String {
        format!(
            "Identify the country in which the entity called {} is located. \
             Use the following web search snippets as context:\n{}",
            entity, context
        )
    }

    async fn complete(&self, entity: &str, context: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, CHAT_COMPLETIONS_PATH);
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: Self::build_prompt(entity, context),
            }],
        };

        tracing::debug!("📡 Chat completion request for entity: {}", entity);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EtlError::ProcessingError {
                message: format!(
                    "Chat completion failed with status: {}",
                    response.status()
                ),
            });
        }

        let body: ChatResponse = response.json().await?;
        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_else(|| "No response".to_string());

        Ok(text)
    }
}

#[async_trait]
impl AnswerProvider for GroqClient {
    async fn answer(&self, entity: &str, context: &str) -> RowOutcome {
        match self.complete(entity, context).await {
            Ok(text) => RowOutcome::Answered(text),
            Err(e) => {
                let message = format!("Groq processing error: {}", e);
                tracing::warn!("❌ {}", message);
                RowOutcome::Failed(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn test_client(base_url: String) -> GroqClient {
        GroqClient::new("test-key".to_string())
            .unwrap()
            .with_base_url(base_url)
    }

    #[tokio::test]
    async fn answer_returns_first_choice_content() {
        let server = MockServer::start();
        let chat_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/openai/v1/chat/completions")
                .header("authorization", "Bearer test-key")
                .body_contains("llama3-8b-8192")
                .body_contains("Paris")
                .body_contains("capital of France");
            then.status(200).json_body(serde_json::json!({
                "choices": [
                    {"message": {"role": "assistant", "content": "France"}},
                    {"message": {"role": "assistant", "content": "ignored"}}
                ]
            }));
        });

        let client = test_client(server.base_url());
        let outcome = client.answer("Paris", "capital of France").await;

        chat_mock.assert();
        assert_eq!(outcome, RowOutcome::Answered("France".to_string()));
    }

    #[tokio::test]
    async fn empty_choices_fall_back_to_no_response() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/openai/v1/chat/completions");
            then.status(200).json_body(serde_json::json!({"choices": []}));
        });

        let client = test_client(server.base_url());
        assert_eq!(
            client.answer("Paris", "ctx").await,
            RowOutcome::Answered("No response".to_string())
        );
    }

    #[tokio::test]
    async fn http_failure_becomes_formatted_error_string() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/openai/v1/chat/completions");
            then.status(401);
        });

        let client = test_client(server.base_url());
        match client.answer("Paris", "ctx").await {
            RowOutcome::Failed(message) => {
                assert!(message.starts_with("Groq processing error:"));
                assert!(message.contains("401"));
            }
            other => panic!("expected Failed outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn model_override_is_sent() {
        let server = MockServer::start();
        let chat_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/openai/v1/chat/completions")
                .body_contains("llama-3.1-70b");
            then.status(200).json_body(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "ok"}}]
            }));
        });

        let client = test_client(server.base_url()).with_model("llama-3.1-70b");
        client.answer("x", "y").await;
        chat_mock.assert();
    }
}
