pub mod kakao;
pub mod nominatim;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use mapsy_common::{GeocodeError, GeocodeResult};

pub use kakao::KakaoGeocoder;
pub use nominatim::NominatimGeocoder;

// --- GeocodeProvider trait ---

#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    /// Tag recorded in `GeocodeResult::provider`.
    fn name(&self) -> &str;

    async fn geocode(&self, address: &str) -> Result<GeocodeResult, GeocodeError>;
}

// --- Fallback chain ---

/// Providers tried in order until one answers. Any failure, not-found
/// included, moves on to the next provider.
#[derive(Clone)]
pub struct GeocodeFallbackChain {
    providers: Vec<Arc<dyn GeocodeProvider>>,
}

impl GeocodeFallbackChain {
    pub fn new(primary: Arc<dyn GeocodeProvider>, secondary: Arc<dyn GeocodeProvider>) -> Self {
        Self {
            providers: vec![primary, secondary],
        }
    }

    /// `None` when every provider failed.
    pub async fn geocode(&self, address: &str) -> Option<GeocodeResult> {
        for provider in &self.providers {
            match provider.geocode(address).await {
                Ok(result) => {
                    info!(
                        provider = provider.name(),
                        address,
                        lat = result.latitude,
                        lon = result.longitude,
                        "Geocoded"
                    );
                    return Some(result);
                }
                Err(e) => {
                    warn!(provider = provider.name(), address, error = %e, "Geocoding failed, trying next provider");
                }
            }
        }

        warn!(address, "All geocoding providers failed");
        None
    }
}

/// Read a coordinate that providers send as either a string or a number.
pub(crate) fn parse_coordinate(value: &serde_json::Value) -> Result<f64, GeocodeError> {
    match value {
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| GeocodeError::Parse(format!("bad coordinate '{s}'"))),
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| GeocodeError::Parse(format!("bad coordinate {n}"))),
        other => Err(GeocodeError::Parse(format!("bad coordinate {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockGeocoder;

    #[tokio::test]
    async fn primary_success_skips_secondary() {
        let primary = Arc::new(MockGeocoder::found("kakao", 37.5, 127.0));
        let secondary = Arc::new(MockGeocoder::found("nominatim", 1.0, 2.0));
        let chain = GeocodeFallbackChain::new(primary.clone(), secondary.clone());

        let result = chain.geocode("서울 송파구 올림픽로 300").await.unwrap();
        assert_eq!(result.provider, "kakao");
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn primary_failure_falls_back() {
        let primary = Arc::new(MockGeocoder::failing("kakao"));
        let secondary = Arc::new(MockGeocoder::found("nominatim", 35.1, 129.0));
        let chain = GeocodeFallbackChain::new(primary.clone(), secondary.clone());

        let result = chain.geocode("somewhere").await.unwrap();
        assert_eq!(result.provider, "nominatim");
        assert_eq!(result.latitude, 35.1);
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test]
    async fn both_failing_is_none() {
        let chain = GeocodeFallbackChain::new(
            Arc::new(MockGeocoder::failing("kakao")),
            Arc::new(MockGeocoder::failing("nominatim")),
        );
        assert!(chain.geocode("nowhere").await.is_none());
    }

    #[test]
    fn coordinates_from_strings_or_numbers() {
        assert_eq!(parse_coordinate(&serde_json::json!("37.51")).unwrap(), 37.51);
        assert_eq!(parse_coordinate(&serde_json::json!(127.1)).unwrap(), 127.1);
        assert!(parse_coordinate(&serde_json::json!("abc")).is_err());
        assert!(parse_coordinate(&serde_json::Value::Null).is_err());
    }
}
