pub mod auth;
pub mod routes;
pub mod tasks;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tracing::info;

use ai_client::Ollama;
use browserless_client::BrowserlessClient;
use mapsy_common::AppConfig;
use mapsy_pipeline::{
    BrowserSessions, GeocodeFallbackChain, HttpCallbackDispatcher, InstagramScraper,
    KakaoGeocoder, NaverMapSearcher, NominatimGeocoder, Orchestrator, PlaceNameExtractor,
    PlaceResolver, ScraperSet,
};

pub use tasks::BackgroundTasks;

pub struct AppState {
    pub api_key: String,
    pub orchestrator: Arc<Orchestrator>,
    pub geocoder: GeocodeFallbackChain,
    pub tasks: BackgroundTasks,
}

impl AppState {
    /// Wire every pipeline component from config. Nothing reads the
    /// environment after this.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let sessions = BrowserSessions::new(config.browser_max_sessions);
        let browserless = || {
            BrowserlessClient::new(
                &config.browserless_url,
                config.browserless_token.as_deref(),
                config.scrape_timeout(),
            )
            .context("Failed to build Browserless client")
        };

        let scrapers = ScraperSet::new().with_instagram(Arc::new(InstagramScraper::new(
            browserless()?,
            sessions.clone(),
            config.scrape_timeout(),
        )));

        let mut ollama = Ollama::new(&config.ollama_model)
            .with_chat_url(&config.ollama_api_url)
            .with_timeout(config.llm_timeout());
        if !config.ollama_api_key.is_empty() {
            ollama = ollama.with_api_key(&config.ollama_api_key);
        }
        let extractor = PlaceNameExtractor::new(Arc::new(ollama))
            .with_max_attempts(config.extraction_max_attempts);

        let geocoder = GeocodeFallbackChain::new(
            Arc::new(KakaoGeocoder::new(
                &config.kakao_api_url,
                &config.kakao_rest_api_key,
                config.geocode_timeout(),
            )?),
            Arc::new(NominatimGeocoder::new(
                &config.nominatim_url,
                config.geocode_timeout(),
            )?),
        );

        let resolver = PlaceResolver::new(Arc::new(NaverMapSearcher::new(
            browserless()?,
            sessions,
            config.scrape_timeout(),
        )))
        .with_geocoder(geocoder.clone());

        let callback = HttpCallbackDispatcher::new(
            &config.backend_callback_url,
            &config.backend_api_key,
            config.callback_timeout(),
        )?;

        info!(
            model = config.ollama_model.as_str(),
            max_attempts = config.extraction_max_attempts,
            "Pipeline wired"
        );

        Ok(Self {
            api_key: config.ai_server_api_key.clone(),
            orchestrator: Arc::new(Orchestrator::new(
                scrapers,
                extractor,
                resolver,
                Arc::new(callback),
            )),
            geocoder,
            tasks: BackgroundTasks::new(),
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // Pipeline
        .route("/api/extract-places", post(routes::extract_places))
        .route("/api/geocode", post(routes::geocode))
        // Diagnostics
        .route("/api/test/scrape", post(routes::test_scrape))
        .route("/api/test/health", get(routes::test_health))
        .with_state(state)
        .layer(middleware::from_fn(process_time))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Method + path only, no query params or bodies
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

/// Adds `X-Process-Time` (seconds, 4 decimals) to every response.
async fn process_time(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;

    let elapsed = start.elapsed().as_secs_f64();
    if let Ok(value) = HeaderValue::from_str(&format!("{elapsed:.4}")) {
        response.headers_mut().insert("x-process-time", value);
    }
    info!(
        %method,
        path = path.as_str(),
        status = response.status().as_u16(),
        elapsed_secs = elapsed,
        "Request handled"
    );
    response
}
