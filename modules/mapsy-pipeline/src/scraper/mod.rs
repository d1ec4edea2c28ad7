pub mod instagram;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use mapsy_common::{ContentMetadata, Platform, ScrapeError, UrlClassification};

use crate::classifier::classify_url;

pub use instagram::InstagramScraper;

// --- ContentScraper trait ---

/// Turns a classified URL into raw content metadata.
#[async_trait]
pub trait ContentScraper: Send + Sync {
    async fn scrape(&self, classification: &UrlClassification)
        -> Result<ContentMetadata, ScrapeError>;

    fn name(&self) -> &str;
}

// --- Dispatch table ---

/// One optional scraper per platform. Adding a platform means adding a field
/// here and an arm to `scraper_for`, which the compiler enforces.
#[derive(Clone, Default)]
pub struct ScraperSet {
    instagram: Option<Arc<dyn ContentScraper>>,
    youtube: Option<Arc<dyn ContentScraper>>,
}

impl ScraperSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instagram(mut self, scraper: Arc<dyn ContentScraper>) -> Self {
        self.instagram = Some(scraper);
        self
    }

    pub fn with_youtube(mut self, scraper: Arc<dyn ContentScraper>) -> Self {
        self.youtube = Some(scraper);
        self
    }

    pub fn scraper_for(&self, platform: Platform) -> Option<&Arc<dyn ContentScraper>> {
        match platform {
            Platform::Instagram => self.instagram.as_ref(),
            Platform::Youtube => self.youtube.as_ref(),
        }
    }

    pub async fn scrape(
        &self,
        classification: &UrlClassification,
    ) -> Result<ContentMetadata, ScrapeError> {
        let Some(scraper) = self.scraper_for(classification.platform) else {
            warn!(
                platform = %classification.platform,
                url = classification.url.as_str(),
                "No scraper registered for platform"
            );
            return Err(ScrapeError::NotImplemented(classification.platform));
        };

        info!(
            scraper = scraper.name(),
            content_type = classification.content_type.as_str(),
            url = classification.url.as_str(),
            "Dispatching scrape"
        );
        scraper.scrape(classification).await
    }

    /// Classify then scrape. A classification error is reported as a
    /// permanent scrape error.
    pub async fn scrape_url(&self, url: &str) -> Result<ContentMetadata, ScrapeError> {
        let classification = classify_url(url)?;
        self.scrape(&classification).await
    }
}
