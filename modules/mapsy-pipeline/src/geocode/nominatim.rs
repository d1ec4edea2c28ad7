use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use mapsy_common::{GeocodeError, GeocodeResult};

use super::{parse_coordinate, GeocodeProvider};

const USER_AGENT: &str = "MapSee-AI/1.0";

/// OpenStreetMap Nominatim search. Public instance allows 1 req/s.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    api_url: String,
}

#[derive(Deserialize)]
struct NominatimResult {
    lat: serde_json::Value,
    lon: serde_json::Value,
}

impl NominatimGeocoder {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build Nominatim HTTP client")?;
        Ok(Self {
            client,
            api_url: api_url.to_string(),
        })
    }
}

#[async_trait]
impl GeocodeProvider for NominatimGeocoder {
    fn name(&self) -> &str {
        "nominatim"
    }

    async fn geocode(&self, address: &str) -> Result<GeocodeResult, GeocodeError> {
        tracing::debug!(address, "Nominatim geocode request");

        let resp = self
            .client
            .get(&self.api_url)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| GeocodeError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeocodeError::Request(format!(
                "Nominatim returned {status}: {body}"
            )));
        }

        let results: Vec<NominatimResult> = resp
            .json()
            .await
            .map_err(|e| GeocodeError::Parse(e.to_string()))?;

        let first = results
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NotFound(address.to_string()))?;

        Ok(GeocodeResult {
            latitude: parse_coordinate(&first.lat)?,
            longitude: parse_coordinate(&first.lon)?,
            provider: self.name().to_string(),
        })
    }
}
