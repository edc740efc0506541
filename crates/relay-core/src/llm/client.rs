//! Chat-completion HTTP client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::LlmConfig;
use crate::error::Result;

use super::types::*;

/// Why a completion could not be produced
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion API returned {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("failed to parse completion response: {0}")]
    MalformedResponse(String),

    #[error("completion response contained no text")]
    EmptyResponse,
}

/// Something that turns a user message plus context into a reply
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(
        &self,
        user_text: &str,
        context: &str,
    ) -> std::result::Result<String, CompletionError>;
}

/// Build the system instruction for a given context document
pub fn system_prompt(context: &str) -> String {
    format!(
        "You are a helpful customer service assistant for a cushion cover business.\n\
         Use the following product information to answer customer questions:\n\n\
         {}\n\n\
         Be friendly, professional, and provide accurate information based on the product details above.",
        context
    )
}

/// OpenAI-compatible chat-completion client
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
}

impl CompletionClient {
    /// Create a new client; `timeout` bounds each request
    pub fn new(config: &LlmConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    /// Build the request sent for one user message
    pub fn build_request(&self, user_text: &str, context: &str) -> ChatCompletionRequest {
        ChatCompletionRequestBuilder::new(self.model.clone())
            .system(system_prompt(context))
            .user(user_text)
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .build()
    }

    /// Send a chat completion request
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> std::result::Result<ChatCompletionResponse, CompletionError> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!("Sending request to completion API: {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Completion API error: {} - {}", status, body);
            return Err(CompletionError::Api { status, body });
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| CompletionError::MalformedResponse(format!("{} - {}", e, body)))?;

        info!(
            "Completion API response: model={:?}, tokens={}",
            parsed.model,
            parsed.usage.as_ref().map(|u| u.completion_tokens).unwrap_or(0)
        );

        Ok(parsed)
    }
}

#[async_trait]
impl ReplyGenerator for CompletionClient {
    async fn generate(
        &self,
        user_text: &str,
        context: &str,
    ) -> std::result::Result<String, CompletionError> {
        let request = self.build_request(user_text, context);
        let response = self.chat_completion(&request).await?;

        response
            .first_text()
            .map(str::to_string)
            .ok_or(CompletionError::EmptyResponse)
    }
}
