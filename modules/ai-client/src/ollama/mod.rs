mod client;
pub(crate) mod types;

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::schema::StructuredOutput;
use crate::traits::{Message, StructuredChat};
use crate::util::strip_code_blocks;

use client::OllamaClient;
use types::ChatRequest;

pub const DEFAULT_CHAT_URL: &str = "http://localhost:11434/api/chat";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

// =============================================================================
// Ollama Agent
// =============================================================================

#[derive(Clone)]
pub struct Ollama {
    chat_url: String,
    pub(crate) model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl Ollama {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            chat_url: DEFAULT_CHAT_URL.to_string(),
            model: model.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Full URL of the `/api/chat` endpoint.
    pub fn with_chat_url(mut self, url: impl Into<String>) -> Self {
        self.chat_url = url.into();
        self
    }

    /// Key sent as `X-API-KEY`, for servers behind an authenticating proxy.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn client(&self) -> Result<OllamaClient> {
        OllamaClient::new(&self.chat_url, self.api_key.as_deref(), self.timeout)
    }

    /// Type-safe structured extraction from a single user prompt.
    pub async fn extract<T: StructuredOutput>(&self, user_prompt: impl Into<String>) -> Result<T> {
        let content = self
            .structured_chat(vec![Message::user(user_prompt)], T::format_schema())
            .await?
            .ok_or_else(|| anyhow!("Ollama response has no content"))?;

        serde_json::from_str(strip_code_blocks(&content))
            .map_err(|e| anyhow!("Failed to deserialize {}: {}", T::type_name(), e))
    }
}

#[async_trait]
impl StructuredChat for Ollama {
    async fn structured_chat(
        &self,
        messages: Vec<Message>,
        schema: serde_json::Value,
    ) -> Result<Option<String>> {
        let request = ChatRequest::new(&self.model, messages)
            .format(schema)
            .temperature(0.0);

        let response = self.client()?.chat(&request).await?;
        Ok(response.into_content())
    }
}
