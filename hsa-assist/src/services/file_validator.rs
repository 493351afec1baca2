//! Receipt file loading and pre-flight validation
//!
//! Uploads must be an image or a PDF and no larger than the configured
//! limit (10 MiB by default). Validation runs before anything is sent;
//! the request client does not re-check.

use base64::{engine::general_purpose, Engine as _};
use std::path::Path;

use crate::error::ValidationFailure;
use crate::models::{ImageData, MessageAttachment};

const PDF_MIME: &str = "application/pdf";
const UNKNOWN_MIME: &str = "application/octet-stream";

/// A file picked for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileAttachment {
    /// Wrap in-memory bytes, detecting the media type from content then name
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = detect_mime_type(&file_name, &bytes);
        Self {
            file_name,
            mime_type,
            bytes,
        }
    }

    /// Read a file from disk
    pub async fn from_path(path: &Path) -> Result<Self, ValidationFailure> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ValidationFailure::Unreadable {
                file: file_name.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self::from_bytes(file_name, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Inline base64 form for the classification request
    pub fn to_image_data(&self) -> ImageData {
        ImageData {
            serialized_image: general_purpose::STANDARD.encode(&self.bytes),
            mime_type: self.mime_type.clone(),
        }
    }

    /// Transcript form (metadata only, bytes stay out of the transcript)
    pub fn to_message_attachment(&self) -> MessageAttachment {
        MessageAttachment {
            file_name: Some(self.file_name.clone()),
            mime_type: self.mime_type.clone(),
            serialized_image: None,
        }
    }
}

/// Images of any kind and PDF
pub fn is_accepted_media_type(mime_type: &str) -> bool {
    mime_type.starts_with("image/") || mime_type == PDF_MIME
}

/// Check one attachment against type and size limits
pub fn validate_attachment(
    attachment: &FileAttachment,
    max_bytes: u64,
) -> Result<(), ValidationFailure> {
    if !is_accepted_media_type(&attachment.mime_type) {
        return Err(ValidationFailure::UnsupportedMediaType {
            file: attachment.file_name.clone(),
            mime_type: attachment.mime_type.clone(),
        });
    }

    if attachment.size() > max_bytes {
        return Err(ValidationFailure::FileTooLarge {
            file: attachment.file_name.clone(),
            size: attachment.size(),
            limit: max_bytes,
        });
    }

    Ok(())
}

/// Check every attachment; the first failure wins
pub fn validate_attachments(
    attachments: &[FileAttachment],
    max_bytes: u64,
) -> Result<(), ValidationFailure> {
    attachments
        .iter()
        .try_for_each(|a| validate_attachment(a, max_bytes))
}

fn detect_mime_type(file_name: &str, bytes: &[u8]) -> String {
    if let Some(kind) = infer::get(bytes) {
        return kind.mime_type().to_string();
    }

    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let mime = match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("pdf") => PDF_MIME,
        _ => UNKNOWN_MIME,
    };
    mime.to_string()
}
