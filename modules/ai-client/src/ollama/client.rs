use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use tracing::debug;

use super::types::*;

pub(crate) struct OllamaClient {
    http: reqwest::Client,
    chat_url: String,
    api_key: Option<String>,
}

impl OllamaClient {
    pub fn new(chat_url: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Ollama HTTP client")?;

        Ok(Self {
            http,
            chat_url: chat_url.to_string(),
            api_key: api_key.filter(|k| !k.is_empty()).map(String::from),
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(ref key) = self.api_key {
            headers.insert("X-API-KEY", HeaderValue::from_str(key)?);
        }
        Ok(headers)
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        debug!(model = %request.model, "Ollama chat request");

        let response = self
            .http
            .post(&self.chat_url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow!("Ollama request timed out: {e}")
                } else {
                    anyhow!("Ollama request failed: {e}")
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Ollama API error ({}): {}", status, error_text));
        }

        response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to decode Ollama response: {e}"))
    }
}
