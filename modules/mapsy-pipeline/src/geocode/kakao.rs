use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use mapsy_common::{GeocodeError, GeocodeResult};

use super::{parse_coordinate, GeocodeProvider};

/// Kakao Local address search. Korean addresses only.
pub struct KakaoGeocoder {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct AddressSearch {
    #[serde(default)]
    documents: Vec<AddressDocument>,
}

#[derive(Deserialize)]
struct AddressDocument {
    x: serde_json::Value,
    y: serde_json::Value,
}

impl KakaoGeocoder {
    pub fn new(api_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Kakao HTTP client")?;
        Ok(Self {
            client,
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl GeocodeProvider for KakaoGeocoder {
    fn name(&self) -> &str {
        "kakao"
    }

    async fn geocode(&self, address: &str) -> Result<GeocodeResult, GeocodeError> {
        tracing::debug!(address, "Kakao geocode request");

        let resp = self
            .client
            .get(&self.api_url)
            .query(&[("query", address)])
            .header("Authorization", format!("KakaoAK {}", self.api_key))
            .send()
            .await
            .map_err(|e| GeocodeError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeocodeError::Request(format!("Kakao returned {status}: {body}")));
        }

        let search: AddressSearch = resp
            .json()
            .await
            .map_err(|e| GeocodeError::Parse(e.to_string()))?;

        let document = search
            .documents
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NotFound(address.to_string()))?;

        Ok(GeocodeResult {
            latitude: parse_coordinate(&document.y)?,
            longitude: parse_coordinate(&document.x)?,
            provider: self.name().to_string(),
        })
    }
}
