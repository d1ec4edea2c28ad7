use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

// =============================================================================
// Message Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

// =============================================================================
// StructuredChat Trait
// =============================================================================

/// A chat backend that constrains its reply to a JSON schema.
///
/// `Ok(None)` means the backend answered but the reply carried no content
/// field. Callers decide whether that counts as a failure.
#[async_trait]
pub trait StructuredChat: Send + Sync {
    async fn structured_chat(
        &self,
        messages: Vec<Message>,
        schema: serde_json::Value,
    ) -> Result<Option<String>>;
}
