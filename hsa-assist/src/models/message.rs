//! Chat transcript entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::wire::ImageData;

/// Transcript entry identifier (random, never time-derived)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(hsa_common::uuid_utils::generate())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Attachment shown alongside a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageAttachment {
    /// Set for user uploads
    pub file_name: Option<String>,
    pub mime_type: String,
    /// Set for service-returned images
    pub serialized_image: Option<String>,
}

impl From<ImageData> for MessageAttachment {
    fn from(data: ImageData) -> Self {
        Self {
            file_name: None,
            mime_type: data.mime_type,
            serialized_image: Some(data.serialized_image),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub attachments: Vec<MessageAttachment>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>, attachments: Vec<MessageAttachment>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content: content.into(),
            timestamp: hsa_common::time::now(),
            attachments,
        }
    }

    pub fn user(content: impl Into<String>, attachments: Vec<MessageAttachment>) -> Self {
        Self::new(Role::User, content, attachments)
    }

    pub fn assistant(content: impl Into<String>, attachments: Vec<MessageAttachment>) -> Self {
        Self::new(Role::Assistant, content, attachments)
    }
}
