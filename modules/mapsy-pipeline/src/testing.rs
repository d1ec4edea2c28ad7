// Test mocks for the extraction pipeline.
//
// One mock per capability seam:
// - MockScraper (ContentScraper): fixed caption, failure or panic
// - MockBackend (ExtractionBackend): scripted replies, records prompts
// - MockSearcher (PlaceSearcher): HashMap-based name→PlaceDetail
// - MockGeocoder (GeocodeProvider): fixed hit or miss
// - RecordingCallback (CallbackSender): keeps every payload it is given

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use mapsy_common::{
    CallbackPayload, ContentMetadata, GeocodeError, GeocodeResult, PlaceDetail, ResolveError,
    ScrapeError, UrlClassification,
};

use crate::callback::CallbackSender;
use crate::extractor::ExtractionBackend;
use crate::geocode::GeocodeProvider;
use crate::resolver::PlaceSearcher;
use crate::scraper::ContentScraper;

// ---------------------------------------------------------------------------
// MockScraper
// ---------------------------------------------------------------------------

enum ScrapeBehavior {
    Caption(Option<String>),
    Fail(String),
    Panic(String),
}

pub struct MockScraper {
    behavior: ScrapeBehavior,
    calls: AtomicUsize,
}

impl MockScraper {
    pub fn with_caption(caption: &str) -> Self {
        Self::new(ScrapeBehavior::Caption(Some(caption.to_string())))
    }

    pub fn without_caption() -> Self {
        Self::new(ScrapeBehavior::Caption(None))
    }

    pub fn failing(message: &str) -> Self {
        Self::new(ScrapeBehavior::Fail(message.to_string()))
    }

    pub fn panicking(message: &str) -> Self {
        Self::new(ScrapeBehavior::Panic(message.to_string()))
    }

    fn new(behavior: ScrapeBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentScraper for MockScraper {
    async fn scrape(
        &self,
        classification: &UrlClassification,
    ) -> Result<ContentMetadata, ScrapeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            ScrapeBehavior::Caption(caption) => {
                let mut meta = ContentMetadata::new(classification);
                meta.caption = caption.clone();
                Ok(meta)
            }
            ScrapeBehavior::Fail(message) => Err(ScrapeError::Failed(message.clone())),
            ScrapeBehavior::Panic(message) => panic!("{}", message),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// MockBackend
// ---------------------------------------------------------------------------

pub enum MockReply {
    Content(String),
    NoContent,
    Error(String),
}

impl MockReply {
    pub fn json(body: &str) -> Self {
        MockReply::Content(body.to_string())
    }
}

/// Replies are consumed in order. Running out counts as a backend error.
pub struct MockBackend {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<(String, serde_json::Value)>>,
}

impl MockBackend {
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<(String, serde_json::Value)> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ExtractionBackend for MockBackend {
    async fn complete(&self, prompt: &str, schema: serde_json::Value) -> Result<Option<String>> {
        self.requests
            .lock()
            .unwrap()
            .push((prompt.to_string(), schema));
        match self.replies.lock().unwrap().pop_front() {
            Some(MockReply::Content(c)) => Ok(Some(c)),
            Some(MockReply::NoContent) => Ok(None),
            Some(MockReply::Error(e)) => Err(anyhow!(e)),
            None => Err(anyhow!("MockBackend: no reply scripted")),
        }
    }
}

// ---------------------------------------------------------------------------
// MockSearcher
// ---------------------------------------------------------------------------

/// Unregistered names fail with `NotFound`.
pub struct MockSearcher {
    places: HashMap<String, PlaceDetail>,
    queries: Mutex<Vec<String>>,
}

impl MockSearcher {
    pub fn new() -> Self {
        Self {
            places: HashMap::new(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn on_place(mut self, name: &str, detail: PlaceDetail) -> Self {
        self.places.insert(name.to_string(), detail);
        self
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl Default for MockSearcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaceSearcher for MockSearcher {
    async fn search_and_resolve(&self, name: &str) -> Result<PlaceDetail, ResolveError> {
        self.queries.lock().unwrap().push(name.to_string());
        self.places
            .get(name)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(name.to_string()))
    }
}

// ---------------------------------------------------------------------------
// MockGeocoder
// ---------------------------------------------------------------------------

pub struct MockGeocoder {
    name: String,
    hit: Option<(f64, f64)>,
    calls: AtomicUsize,
}

impl MockGeocoder {
    pub fn found(name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.to_string(),
            hit: Some((latitude, longitude)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(name: &str) -> Self {
        Self {
            name: name.to_string(),
            hit: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeocodeProvider for MockGeocoder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn geocode(&self, address: &str) -> Result<GeocodeResult, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.hit {
            Some((latitude, longitude)) => Ok(GeocodeResult {
                latitude,
                longitude,
                provider: self.name.clone(),
            }),
            None => Err(GeocodeError::NotFound(address.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingCallback
// ---------------------------------------------------------------------------

pub struct RecordingCallback {
    accept: bool,
    payloads: Mutex<Vec<CallbackPayload>>,
}

impl RecordingCallback {
    pub fn accepting() -> Self {
        Self {
            accept: true,
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            accept: false,
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub fn payloads(&self) -> Vec<CallbackPayload> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl CallbackSender for RecordingCallback {
    async fn send(&self, payload: &CallbackPayload) -> bool {
        self.payloads.lock().unwrap().push(payload.clone());
        self.accept
    }
}
