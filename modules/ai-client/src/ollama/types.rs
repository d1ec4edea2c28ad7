use serde::{Deserialize, Serialize};

use crate::traits::Message;

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<ChatOptions>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: false,
            format: None,
            options: None,
        }
    }

    pub fn format(mut self, schema: serde_json::Value) -> Self {
        self.format = Some(schema);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options = Some(ChatOptions {
            temperature: Some(temperature),
        });
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Non-streaming `/api/chat` reply. Every field may be missing.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub message: Option<ResponseMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// The reply text, treating an empty string as absent.
    pub fn into_content(self) -> Option<String> {
        self.message
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_unset_format() {
        let req = ChatRequest::new("gemma3", vec![Message::user("hi")]);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["stream"], false);
        assert!(json.get("format").is_none());
        assert!(json.get("options").is_none());
    }

    #[test]
    fn response_without_message_has_no_content() {
        let resp: ChatResponse = serde_json::from_str(r#"{"done": true}"#).unwrap();
        assert!(resp.into_content().is_none());
    }

    #[test]
    fn blank_content_counts_as_missing() {
        let resp: ChatResponse =
            serde_json::from_str(r#"{"message": {"role": "assistant", "content": "  "}}"#)
                .unwrap();
        assert!(resp.into_content().is_none());
    }
}
