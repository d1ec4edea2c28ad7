use thiserror::Error;

use crate::types::Platform;

/// A URL the pipeline cannot handle. Never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Unsupported {platform} URL shape: {url}")]
    UnsupportedContentShape { platform: Platform, url: String },
}

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("{0} scraping is not implemented")]
    NotImplemented(Platform),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error("Scrape timed out after {0}s")]
    Timeout(u64),

    #[error("Scrape failed: {0}")]
    Failed(String),
}

impl ScrapeError {
    /// Errors that would fail identically on a second attempt.
    pub fn is_permanent(&self) -> bool {
        matches!(self, ScrapeError::NotImplemented(_) | ScrapeError::Classify(_))
    }
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("No search results for '{0}'")]
    NotFound(String),

    #[error("Map search timed out for '{0}'")]
    Timeout(String),

    #[error("Map search failed: {0}")]
    Search(String),
}

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("No geocode result for '{0}'")]
    NotFound(String),

    #[error("Geocode request failed: {0}")]
    Request(String),

    #[error("Unexpected geocode response: {0}")]
    Parse(String),
}
