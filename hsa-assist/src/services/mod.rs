//! Outbound service access and upload validation

pub mod file_validator;
pub mod request_client;

pub use file_validator::{
    is_accepted_media_type, validate_attachment, validate_attachments, FileAttachment,
};
pub use request_client::{ClientConfig, ReceiptService, RequestClient};
