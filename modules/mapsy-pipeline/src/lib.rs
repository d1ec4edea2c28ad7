pub mod callback;
pub mod classifier;
pub mod extractor;
pub mod geocode;
pub mod naver_map;
pub mod orchestrator;
pub mod resolver;
pub mod scraper;
pub mod sessions;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use callback::{CallbackOutcome, CallbackSender, HttpCallbackDispatcher};
pub use classifier::classify_url;
pub use extractor::{extract_with_retry, ExtractionBackend, PlaceNameExtractor};
pub use geocode::{GeocodeFallbackChain, GeocodeProvider, KakaoGeocoder, NominatimGeocoder};
pub use naver_map::NaverMapSearcher;
pub use orchestrator::{Orchestrator, RunReport, Stage};
pub use resolver::{PlaceResolver, PlaceSearcher};
pub use scraper::{ContentScraper, InstagramScraper, ScraperSet};
pub use sessions::BrowserSessions;
