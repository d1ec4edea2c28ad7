use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::callback::ExtractionStatistics;

// --- Platform ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Youtube,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Youtube => "youtube",
        }
    }

    /// Tag used in the callback's `snsInfo.platform`.
    pub fn callback_tag(&self) -> &'static str {
        match self {
            Platform::Instagram => "INSTAGRAM",
            Platform::Youtube => "YOUTUBE",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Inbound request ---

/// One pipeline run's input. `snsUrl` is the field name the backend sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    #[serde(rename = "contentId")]
    pub content_id: Uuid,
    #[serde(rename = "snsUrl", alias = "sourceUrl")]
    pub source_url: String,
}

impl ExtractionRequest {
    pub fn new(content_id: Uuid, source_url: impl Into<String>) -> Self {
        Self {
            content_id,
            source_url: source_url.into(),
        }
    }
}

// --- Classification ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlClassification {
    pub platform: Platform,
    /// "post", "reel", "igtv", "video", "shorts"
    pub content_type: String,
    pub url: String,
}

// --- Scraped metadata ---

/// What a platform scraper produces. Only `platform` and `caption` are read by
/// the pipeline; everything else is carried through to the callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentMetadata {
    pub platform: Platform,
    pub content_type: String,
    pub url: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub likes_count: Option<i64>,
    #[serde(default)]
    pub comments_count: Option<i64>,
    #[serde(default)]
    pub posted_at: Option<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub og_image: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub author_profile_image_url: Option<String>,
    /// Platform-specific fields nobody downstream interprets.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ContentMetadata {
    pub fn new(classification: &UrlClassification) -> Self {
        Self {
            platform: classification.platform,
            content_type: classification.content_type.clone(),
            url: classification.url.clone(),
            caption: None,
            author: None,
            likes_count: None,
            comments_count: None,
            posted_at: None,
            hashtags: Vec::new(),
            og_image: None,
            image_urls: Vec::new(),
            author_profile_image_url: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Caption text, empty when the scraper found none.
    pub fn caption_text(&self) -> &str {
        self.caption.as_deref().unwrap_or("")
    }
}

// --- Extraction ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedPlaceNames {
    pub names: Vec<String>,
    pub has_places: bool,
}

impl ExtractedPlaceNames {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

// --- Place detail ---

/// A resolved place. Every attribute besides the id and name is optional;
/// a missing attribute is a normal outcome of scraping, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaceDetail {
    pub place_id: String,
    pub name: String,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub road_address: Option<String>,

    pub category: Option<String>,
    pub description: Option<String>,

    pub rating: Option<f64>,
    pub visitor_review_count: Option<i64>,
    pub blog_review_count: Option<i64>,

    pub business_status: Option<String>,
    pub business_hours: Option<String>,
    pub open_hours_detail: Vec<String>,
    pub holiday_info: Option<String>,

    pub phone_number: Option<String>,
    pub homepage_url: Option<String>,
    pub naver_map_url: Option<String>,
    pub reservation_available: bool,

    pub subway_info: Option<String>,
    pub directions_text: Option<String>,
    pub amenities: Vec<String>,
    pub keywords: Vec<String>,
    pub tv_appearances: Vec<String>,
    pub menu_info: Vec<String>,

    pub image_url: Option<String>,
    pub image_urls: Vec<String>,
}

impl PlaceDetail {
    pub fn new(place_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            place_id: place_id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

// --- Resolution ---

#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    Resolved(PlaceDetail),
    Failed(String),
}

/// Outcomes partitioned into successes and failures, each in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub resolved: Vec<PlaceDetail>,
    pub failed: Vec<String>,
}

impl Resolution {
    pub fn push(&mut self, outcome: ResolutionOutcome) {
        match outcome {
            ResolutionOutcome::Resolved(detail) => self.resolved.push(detail),
            ResolutionOutcome::Failed(name) => self.failed.push(name),
        }
    }
}

impl FromIterator<ResolutionOutcome> for Resolution {
    fn from_iter<I: IntoIterator<Item = ResolutionOutcome>>(iter: I) -> Self {
        let mut resolution = Resolution::default();
        for outcome in iter {
            resolution.push(outcome);
        }
        resolution
    }
}

// --- Geocoding ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub latitude: f64,
    pub longitude: f64,
    pub provider: String,
}

// --- Pipeline result ---

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResult {
    pub source_metadata: ContentMetadata,
    pub extracted_names: Vec<String>,
    pub resolved_places: Vec<PlaceDetail>,
    pub failed_names: Vec<String>,
}

impl PipelineResult {
    pub fn new(
        source_metadata: ContentMetadata,
        extracted: ExtractedPlaceNames,
        resolution: Resolution,
    ) -> Self {
        Self {
            source_metadata,
            extracted_names: extracted.names,
            resolved_places: resolution.resolved,
            failed_names: resolution.failed,
        }
    }

    /// Counts are read off the final lists.
    pub fn statistics(&self) -> ExtractionStatistics {
        ExtractionStatistics {
            extracted_place_names: self.extracted_names.clone(),
            total_extracted: self.extracted_names.len(),
            total_found: self.resolved_places.len(),
            failed_searches: self.failed_names.clone(),
        }
    }
}
