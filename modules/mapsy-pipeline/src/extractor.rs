use std::sync::Arc;

use ai_client::{strip_code_blocks, Message, Ollama, StructuredChat, StructuredOutput};
use anyhow::Result;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, warn};

use mapsy_common::ExtractedPlaceNames;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

const PLACE_EXTRACTION_PROMPT: &str = "다음 텍스트에서 장소명(가게명, 상호명, 식당명, 카페명, 관광지명 등)을 추출하세요.

장소명 예시:
- 스타벅스 종합운동장사거리점
- 블루보틀 성수
- 스시호
- 사사노하

규칙:
1. 텍스트에 언급된 실제 장소명만 추출하세요.
2. 해시태그(#)가 붙어있어도 장소명이면 추출하세요. (#스시호 → 스시호)
3. 일반 명사(맛집, 초밥, 카페 등)는 장소명이 아닙니다.
4. 장소가 없으면 빈 배열 []을 반환하세요.

<Context>
{caption}
</Context>";

// --- Backend seam ---

/// A language model that answers a prompt under a JSON schema.
///
/// `Ok(None)` means the reply had no content field.
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    async fn complete(&self, prompt: &str, schema: serde_json::Value) -> Result<Option<String>>;
}

#[async_trait]
impl ExtractionBackend for Ollama {
    async fn complete(&self, prompt: &str, schema: serde_json::Value) -> Result<Option<String>> {
        self.structured_chat(vec![Message::user(prompt)], schema)
            .await
    }
}

/// Shape the model must answer with.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PlaceNamesResponse {
    pub place_names: Vec<String>,
    pub has_places: bool,
}

pub fn build_prompt(text: &str) -> String {
    PLACE_EXTRACTION_PROMPT.replace("{caption}", text)
}

// --- Retry loop ---

/// Ask the backend for place names, at most `max_attempts` times.
///
/// Never fails. Blank input returns the empty result without calling the
/// backend; an attempt counts as failed on a backend error, a missing content
/// field or a reply that does not match the schema; the first good reply
/// wins; exhausting every attempt returns the empty result.
pub async fn extract_with_retry(
    backend: &dyn ExtractionBackend,
    text: &str,
    max_attempts: u32,
) -> ExtractedPlaceNames {
    if text.trim().is_empty() {
        info!("Empty text, skipping place name extraction");
        return ExtractedPlaceNames::empty();
    }

    let prompt = build_prompt(text);
    let schema = PlaceNamesResponse::format_schema();

    for attempt in 1..=max_attempts {
        info!(attempt, max_attempts, "Place name extraction attempt");

        let content = match backend.complete(&prompt, schema.clone()).await {
            Ok(Some(content)) => content,
            Ok(None) => {
                warn!(attempt, "Backend reply has no content");
                continue;
            }
            Err(e) => {
                warn!(attempt, error = %e, "Backend call failed");
                continue;
            }
        };

        match serde_json::from_str::<PlaceNamesResponse>(strip_code_blocks(&content)) {
            Ok(response) => {
                let extracted = normalize(response);
                info!(attempt, names = ?extracted.names, "Place names extracted");
                return extracted;
            }
            Err(e) => {
                warn!(
                    attempt,
                    error = %e,
                    content = ai_client::truncate_to_char_boundary(&content, 200),
                    "Backend reply does not match schema"
                );
            }
        }
    }

    warn!(max_attempts, "Place name extraction exhausted all attempts");
    ExtractedPlaceNames::empty()
}

fn normalize(response: PlaceNamesResponse) -> ExtractedPlaceNames {
    let names: Vec<String> = response
        .place_names
        .into_iter()
        .map(|n| n.trim().trim_start_matches('#').trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();

    if response.has_places == names.is_empty() {
        warn!(
            has_places = response.has_places,
            count = names.len(),
            "has_places disagrees with the extracted names"
        );
    }

    ExtractedPlaceNames {
        names,
        has_places: response.has_places,
    }
}

// --- Extractor ---

#[derive(Clone)]
pub struct PlaceNameExtractor {
    backend: Arc<dyn ExtractionBackend>,
    max_attempts: u32,
}

impl PlaceNameExtractor {
    pub fn new(backend: Arc<dyn ExtractionBackend>) -> Self {
        Self {
            backend,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub async fn extract(&self, text: &str) -> ExtractedPlaceNames {
        extract_with_retry(self.backend.as_ref(), text, self.max_attempts).await
    }
}
