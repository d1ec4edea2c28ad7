use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{ContentMetadata, PipelineResult, PlaceDetail};

/// Body POSTed to the backend once per pipeline run.
///
/// The Failed variant has no room for place data or statistics, so a failure
/// can never be reported with a partial result attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resultStatus", rename_all = "UPPERCASE")]
pub enum CallbackPayload {
    #[serde(rename_all = "camelCase")]
    Success {
        content_id: Uuid,
        sns_info: SnsInfo,
        place_details: Vec<PlaceDetail>,
        statistics: ExtractionStatistics,
    },
    #[serde(rename_all = "camelCase")]
    Failed {
        content_id: Uuid,
        error_message: String,
    },
}

impl CallbackPayload {
    pub fn success(content_id: Uuid, result: PipelineResult) -> Self {
        let statistics = result.statistics();
        CallbackPayload::Success {
            content_id,
            sns_info: SnsInfo::from_metadata(&result.source_metadata),
            place_details: result.resolved_places,
            statistics,
        }
    }

    pub fn failed(content_id: Uuid, error_message: impl Into<String>) -> Self {
        CallbackPayload::Failed {
            content_id,
            error_message: error_message.into(),
        }
    }

    pub fn content_id(&self) -> Uuid {
        match self {
            CallbackPayload::Success { content_id, .. } => *content_id,
            CallbackPayload::Failed { content_id, .. } => *content_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CallbackPayload::Success { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnsInfo {
    pub platform: String,
    pub content_type: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<String>,
    pub hashtags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub image_urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_profile_image_url: Option<String>,
}

impl SnsInfo {
    pub fn from_metadata(meta: &ContentMetadata) -> Self {
        Self {
            platform: meta.platform.callback_tag().to_string(),
            content_type: meta.content_type.clone(),
            url: meta.url.clone(),
            author: meta.author.clone(),
            caption: meta.caption.clone(),
            likes_count: meta.likes_count,
            comments_count: meta.comments_count,
            posted_at: meta.posted_at.clone(),
            hashtags: meta.hashtags.clone(),
            thumbnail_url: meta.og_image.clone(),
            image_urls: meta.image_urls.clone(),
            author_profile_image_url: meta.author_profile_image_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionStatistics {
    pub extracted_place_names: Vec<String>,
    pub total_extracted: usize,
    pub total_found: usize,
    pub failed_searches: Vec<String>,
}
