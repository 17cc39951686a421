use super::model::{Generator, Message};
use crate::agent::prompt::GenerationRequest;
use crate::config::GenerationConfig;
use crate::error::{Result, TalkDbError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MAX_ERROR_BODY: usize = 300;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completions client (Groq, OpenAI)
pub struct ChatCompletionClient {
    config: GenerationConfig,
    http: reqwest::Client,
    request_timeout: Duration,
}

impl ChatCompletionClient {
    /// `request_timeout` should be the pipeline's own bound so an expired
    /// question reports as a timeout rather than an unavailable provider
    pub fn new(config: GenerationConfig, request_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| TalkDbError::Config(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            config,
            http,
            request_timeout,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url())
    }
}

#[async_trait]
impl Generator for ChatCompletionClient {
    #[tracing::instrument(
        skip(self, request),
        fields(llm.provider = %self.config.provider, llm.model = %self.config.model())
    )]
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        // checked per call so a missing key is reported at first use
        let api_key = self.config.api_key()?;
        let model = self.config.model();
        let messages = request.messages();

        let body = ChatCompletionRequest {
            model: &model,
            messages: &messages,
            temperature: 0.0,
        };

        let response = self
            .http
            .post(self.endpoint())
            .timeout(self.request_timeout)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TalkDbError::GenerationUnavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            TalkDbError::GenerationUnavailable(format!("failed to read response: {}", e))
        })?;

        if !status.is_success() {
            return Err(TalkDbError::GenerationUnavailable(format!(
                "provider returned {}: {}",
                status,
                truncate(&text, MAX_ERROR_BODY)
            )));
        }

        let content = parse_completion(&text)?;
        tracing::debug!(chars = content.len(), "completion received");
        Ok(content)
    }
}

/// first choice's message content from a chat completions body
fn parse_completion(body: &str) -> Result<String> {
    let response: ChatCompletionResponse = serde_json::from_str(body).map_err(|e| {
        TalkDbError::GenerationUnavailable(format!("unexpected provider response: {}", e))
    })?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| {
            TalkDbError::GenerationUnavailable("provider response had no content".to_string())
        })
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    }
}
