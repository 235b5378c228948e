use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use serde::{ Serialize, Deserialize };

/// Who produced a message. Serialized lowercase to match the provider wire
/// format (`"user"` / `"assistant"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Resolution hint forwarded to the provider alongside an image part.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    #[default]
    Auto,
    Low,
    High,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
    pub detail: ImageDetail,
}

/// One piece of message content, in the provider's tagged wire shape:
/// `{"type":"text","text":...}` or
/// `{"type":"image_url","image_url":{"url":...,"detail":...}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    ImageUrl {
        image_url: ImageUrl,
    },
}

impl ContentPart {
    pub fn text(value: impl Into<String>) -> Self {
        ContentPart::Text { text: value.into() }
    }

    pub fn image(data_uri: impl Into<String>) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: data_uri.into(),
                detail: ImageDetail::Auto,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ContentPart::Text { text } => text.trim().is_empty(),
            ContentPart::ImageUrl { image_url } => image_url.url.is_empty(),
        }
    }
}

/// One turn of the conversation. Immutable once appended to the store.
/// The timestamp is local bookkeeping only and never reaches the wire.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentPart>,
    #[serde(skip_serializing, default = "now_millis")]
    pub timestamp: i64,
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl Message {
    pub fn user(content: Vec<ContentPart>) -> Self {
        Self {
            role: Role::User,
            content,
            timestamp: now_millis(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentPart::text(text)],
            timestamp: now_millis(),
        }
    }

    /// A message is only worth sending if at least one part carries content.
    pub fn has_content(&self) -> bool {
        self.content.iter().any(|part| !part.is_empty())
    }
}

/// Body of `POST /api/chat`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub history: Vec<Message>,
}

/// Successful gateway reply.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Error reply for 400/405/500.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

/// Inline a binary image as a `data:` URI.
pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}
