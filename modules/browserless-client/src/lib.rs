pub mod error;

pub use error::{BrowserlessError, Result};

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Extra time the HTTP request gets beyond the browser-side timeout, so the
/// server reports its own timeout before the socket gives up.
const REQUEST_SLACK: Duration = Duration::from_secs(5);

pub struct BrowserlessClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

#[derive(Serialize)]
struct FunctionRequest<'a, C: Serialize> {
    code: &'a str,
    context: &'a C,
}

impl BrowserlessClient {
    /// `timeout` bounds a single browser session on the server side.
    pub fn new(base_url: &str, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout + REQUEST_SLACK)
            .build()
            .map_err(|e| BrowserlessError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()).map(String::from),
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .post(format!("{}/{}", self.base_url, path))
            .query(&[("timeout", self.timeout.as_millis().to_string())]);
        if let Some(ref token) = self.token {
            req = req.query(&[("token", token.as_str())]);
        }
        req
    }

    /// Run a Puppeteer function in a fresh browser session via `/function`.
    ///
    /// `code` is an ES module whose default export receives `{ page, context }`
    /// and returns `{ data, type: "application/json" }`. The server owns the
    /// browser and closes it when the function settles or times out.
    pub async fn function<C, T>(&self, code: &str, context: &C) -> Result<T>
    where
        C: Serialize + Sync,
        T: DeserializeOwned,
    {
        tracing::debug!(timeout_ms = self.timeout.as_millis() as u64, "Browserless function call");

        let resp = self
            .request("function")
            .json(&FunctionRequest { code, context })
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::REQUEST_TIMEOUT {
            let message = resp.text().await.unwrap_or_default();
            return Err(BrowserlessError::Timeout(message));
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BrowserlessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
