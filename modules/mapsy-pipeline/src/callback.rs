use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{error, info};

use mapsy_common::CallbackPayload;

pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivers the final payload. `true` only when the receiver accepted it.
#[async_trait]
pub trait CallbackSender: Send + Sync {
    async fn send(&self, payload: &CallbackPayload) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Delivered(u16),
    Timeout,
    Rejected { status: u16, body: String },
    Transport(String),
}

impl CallbackOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, CallbackOutcome::Delivered(_))
    }
}

/// POSTs the payload as JSON with the backend's `X-API-Key`. One attempt,
/// no retry.
pub struct HttpCallbackDispatcher {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl HttpCallbackDispatcher {
    pub fn new(url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build callback HTTP client")?;
        Ok(Self {
            client,
            url: url.to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub async fn deliver(&self, payload: &CallbackPayload) -> CallbackOutcome {
        let content_id = payload.content_id();
        info!(
            %content_id,
            url = self.url.as_str(),
            success = payload.is_success(),
            "Sending callback"
        );

        let result = self
            .client
            .post(&self.url)
            .header("X-API-Key", &self.api_key)
            .json(payload)
            .send()
            .await;

        let outcome = match result {
            Ok(resp) => {
                let status = resp.status();
                if status.is_success() {
                    CallbackOutcome::Delivered(status.as_u16())
                } else {
                    let body = resp.text().await.unwrap_or_default();
                    CallbackOutcome::Rejected {
                        status: status.as_u16(),
                        body,
                    }
                }
            }
            Err(e) if e.is_timeout() => CallbackOutcome::Timeout,
            Err(e) => CallbackOutcome::Transport(e.to_string()),
        };

        match &outcome {
            CallbackOutcome::Delivered(status) => {
                info!(%content_id, status, "Callback delivered")
            }
            CallbackOutcome::Timeout => error!(%content_id, "Callback timed out"),
            CallbackOutcome::Rejected { status, body } => {
                error!(%content_id, status, body = body.as_str(), "Callback rejected")
            }
            CallbackOutcome::Transport(e) => {
                error!(%content_id, error = e.as_str(), "Callback transport error")
            }
        }
        outcome
    }
}

#[async_trait]
impl CallbackSender for HttpCallbackDispatcher {
    async fn send(&self, payload: &CallbackPayload) -> bool {
        self.deliver(payload).await.is_delivered()
    }
}
