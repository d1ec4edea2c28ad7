use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use mapsy_common::{ExtractionRequest, ScrapeError};
use mapsy_pipeline::classify_url;

use crate::auth::ApiKey;
use crate::AppState;

pub const MAX_URL_LEN: usize = 2048;

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({"error": message.into()}))).into_response()
}

// --- POST /api/extract-places ---

#[derive(Debug, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub received: bool,
    pub message: String,
}

/// Validate, start the pipeline in the background and acknowledge at once.
/// Results go to the callback, never into this response.
pub async fn extract_places(
    _key: ApiKey,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExtractionRequest>,
) -> Response {
    let url = request.source_url.trim();
    if url.chars().count() > MAX_URL_LEN {
        return error(
            StatusCode::BAD_REQUEST,
            format!("URL too long (max {MAX_URL_LEN} characters)"),
        );
    }
    if let Err(e) = classify_url(url) {
        warn!(content_id = %request.content_id, url, error = %e, "Rejected unclassifiable URL");
        return error(StatusCode::BAD_REQUEST, e.to_string());
    }

    info!(content_id = %request.content_id, url, "Extraction accepted");

    let orchestrator = state.orchestrator.clone();
    state.tasks.spawn(async move {
        orchestrator.run(request).await;
    });

    Json(Acknowledgement {
        received: true,
        message: "Processing started".to_string(),
    })
    .into_response()
}

// --- POST /api/geocode ---

#[derive(Debug, Deserialize)]
pub struct GeocodeRequest {
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeocodeResponse {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub provider: String,
}

pub async fn geocode(
    _key: ApiKey,
    State(state): State<Arc<AppState>>,
    Json(body): Json<GeocodeRequest>,
) -> Response {
    let address = body.address.trim();
    if address.is_empty() {
        return error(StatusCode::BAD_REQUEST, "address must not be empty");
    }

    match state.geocoder.geocode(address).await {
        Some(result) => Json(GeocodeResponse {
            address: address.to_string(),
            latitude: result.latitude,
            longitude: result.longitude,
            provider: result.provider,
        })
        .into_response(),
        None => error(
            StatusCode::NOT_FOUND,
            format!("No coordinates found for '{address}'"),
        ),
    }
}

// --- POST /api/test/scrape ---

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
}

/// Classification and scraping only, returned inline.
pub async fn test_scrape(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ScrapeRequest>,
) -> Response {
    match state.orchestrator.scrapers().scrape_url(&body.url).await {
        Ok(metadata) => Json(metadata).into_response(),
        Err(e) => {
            let status = match &e {
                ScrapeError::Classify(_) => StatusCode::BAD_REQUEST,
                ScrapeError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
                ScrapeError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                ScrapeError::Failed(_) => StatusCode::BAD_GATEWAY,
            };
            error(status, e.to_string())
        }
    }
}

// --- GET /api/test/health ---

pub async fn test_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "inFlight": state.tasks.in_flight(),
    }))
}
