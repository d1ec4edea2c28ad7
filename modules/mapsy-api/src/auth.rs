use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
};
use tracing::warn;

use crate::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Proof that the request carried the shared `X-API-Key`. Put it first in a
/// handler's arguments so the body is never read for an unauthorized caller.
pub struct ApiKey;

impl FromRequestParts<Arc<AppState>> for ApiKey {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());

        match provided {
            Some(key) if keys_match(key, &state.api_key) => Ok(ApiKey),
            _ => {
                warn!(
                    path = %parts.uri.path(),
                    present = provided.is_some(),
                    "Rejected request with bad API key"
                );
                Err((
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({"error": "Invalid or missing API key"})),
                )
                    .into_response())
            }
        }
    }
}

/// Comparison time depends only on the lengths.
fn keys_match(provided: &str, expected: &str) -> bool {
    let (a, b) = (provided.as_bytes(), expected.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_comparison() {
        assert!(keys_match("secret", "secret"));
        assert!(!keys_match("secreT", "secret"));
        assert!(!keys_match("secret1", "secret"));
        assert!(!keys_match("", "secret"));
    }
}
