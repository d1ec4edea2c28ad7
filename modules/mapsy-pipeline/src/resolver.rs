use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use mapsy_common::{PlaceDetail, Resolution, ResolutionOutcome, ResolveError};

use crate::geocode::GeocodeFallbackChain;

// --- PlaceSearcher trait ---

/// Looks a place name up on a map provider and returns its detail record.
#[async_trait]
pub trait PlaceSearcher: Send + Sync {
    async fn search_and_resolve(&self, name: &str) -> Result<PlaceDetail, ResolveError>;
}

// --- Resolver ---

/// Resolves names one at a time, in input order. A failed lookup is recorded
/// and the loop moves on; nothing here aborts the batch.
///
/// Lookups are sequential so that each map search has the browser to itself.
/// Running them concurrently is possible but not done here.
#[derive(Clone)]
pub struct PlaceResolver {
    searcher: Arc<dyn PlaceSearcher>,
    geocoder: Option<GeocodeFallbackChain>,
}

impl PlaceResolver {
    pub fn new(searcher: Arc<dyn PlaceSearcher>) -> Self {
        Self {
            searcher,
            geocoder: None,
        }
    }

    /// Fill in coordinates for places the map search returned without them.
    pub fn with_geocoder(mut self, geocoder: GeocodeFallbackChain) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub async fn resolve(&self, names: &[String]) -> Resolution {
        let mut outcomes = Vec::with_capacity(names.len());

        for (index, name) in names.iter().enumerate() {
            info!(query = name.as_str(), index, total = names.len(), "Resolving place");

            let outcome = match self.searcher.search_and_resolve(name).await {
                Ok(mut detail) => {
                    self.backfill_coordinates(&mut detail).await;
                    info!(
                        query = name.as_str(),
                        place_id = detail.place_id.as_str(),
                        "Place resolved"
                    );
                    ResolutionOutcome::Resolved(detail)
                }
                Err(e) => {
                    warn!(query = name.as_str(), error = %e, "Place resolution failed");
                    ResolutionOutcome::Failed(name.clone())
                }
            };
            outcomes.push(outcome);
        }

        let resolution: Resolution = outcomes.into_iter().collect();
        info!(
            found = resolution.resolved.len(),
            failed = resolution.failed.len(),
            "Resolution finished"
        );
        resolution
    }

    async fn backfill_coordinates(&self, detail: &mut PlaceDetail) {
        let Some(geocoder) = &self.geocoder else {
            return;
        };
        if detail.has_coordinates() {
            return;
        }
        let Some(address) = detail
            .road_address
            .as_deref()
            .or(detail.address.as_deref())
            .filter(|a| !a.trim().is_empty())
        else {
            return;
        };

        // A miss leaves the coordinates absent.
        if let Some(result) = geocoder.geocode(address).await {
            detail.latitude = Some(result.latitude);
            detail.longitude = Some(result.longitude);
        }
    }
}
