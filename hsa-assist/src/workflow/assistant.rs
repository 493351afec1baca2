//! Chat and review workflow
//!
//! Ties the request client, the stores and the reconciler together. The
//! transcript records what the user saw: one entry per user message, then
//! either the service reply or a single error entry, never one per retry.

use std::sync::Arc;

use hsa_common::config::{IdentityConfig, TomlConfig};

use crate::error::{AssistError, AssistResult, ValidationFailure};
use crate::models::{ChatMessage, MessageAttachment};
use crate::review::{ApprovalOutcome, ApprovalReconciler, ReceiptDraft};
use crate::services::{validate_attachments, FileAttachment, ReceiptService};
use crate::AppState;

/// Identity sent with every classification call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub session_ref: String,
    pub user_ref: String,
}

impl SessionIdentity {
    /// Fresh random identity
    pub fn generate() -> Self {
        Self {
            session_ref: hsa_common::uuid_utils::generate().to_string(),
            user_ref: hsa_common::uuid_utils::generate().to_string(),
        }
    }

    /// Configured values, generating whichever is missing or blank
    pub fn from_config(config: &IdentityConfig) -> Self {
        let pick = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| hsa_common::uuid_utils::generate().to_string())
        };
        Self {
            session_ref: pick(&config.session_id),
            user_ref: pick(&config.user_id),
        }
    }
}

/// What a successful [`Assistant::send_message`] produced
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOutcome {
    /// Display text from the service (may be empty)
    pub reply: String,
    /// Whether a new draft was installed for review
    pub draft_installed: bool,
}

pub struct Assistant {
    service: Arc<dyn ReceiptService>,
    reconciler: ApprovalReconciler,
    state: AppState,
    identity: SessionIdentity,
    max_upload_bytes: u64,
}

impl Assistant {
    pub fn new(service: Arc<dyn ReceiptService>, state: AppState, identity: SessionIdentity) -> Self {
        Self {
            reconciler: ApprovalReconciler::new(service.clone()),
            service,
            state,
            identity,
            max_upload_bytes: hsa_common::config::DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Build with identity and upload limit taken from configuration
    pub fn from_config(service: Arc<dyn ReceiptService>, state: AppState, config: &TomlConfig) -> Self {
        Self::new(service, state, SessionIdentity::from_config(&config.identity))
            .with_max_upload_bytes(config.service.max_upload_bytes)
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: u64) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    /// Send a chat message, optionally with receipt files
    ///
    /// Validation failures return before anything is recorded or sent.
    /// A remote failure leaves one explanatory assistant entry in the
    /// transcript and is returned to the caller.
    pub async fn send_message(
        &self,
        text: &str,
        files: Vec<FileAttachment>,
    ) -> AssistResult<ChatOutcome> {
        if text.trim().is_empty() && files.is_empty() {
            return Err(ValidationFailure::EmptyMessage.into());
        }
        validate_attachments(&files, self.max_upload_bytes)?;

        let attachments = files.iter().map(FileAttachment::to_message_attachment).collect();
        self.state
            .chat
            .write()
            .await
            .add_message(ChatMessage::user(text, attachments));

        let result = self
            .service
            .send_classification(text, &files, &self.identity.session_ref, &self.identity.user_ref)
            .await;

        let mut response = match result {
            Ok(response) => response,
            Err(err) => return Err(self.report_failure(err).await),
        };

        // A review payload the engine cannot hold fails the whole reply
        let image_url = response.image_url.take();
        let draft = match response
            .review_request
            .take()
            .map(|review| ReceiptDraft::from_review(review, image_url))
            .transpose()
        {
            Ok(draft) => draft,
            Err(e) => {
                return Err(self
                    .report_failure(AssistError::InvalidResponse(e.to_string()))
                    .await)
            }
        };

        if let Some(service_error) = response.error.as_deref().filter(|e| !e.is_empty()) {
            tracing::warn!(error = %service_error, "Service reported an error alongside its reply");
        }
        if let Some(thinking) = &response.thinking_process {
            tracing::debug!(thinking = %thinking, "Service reasoning");
        }

        if !response.response.is_empty() {
            let attachments: Vec<MessageAttachment> =
                response.attachments.iter().cloned().map(MessageAttachment::from).collect();
            self.state
                .chat
                .write()
                .await
                .add_message(ChatMessage::assistant(response.response.clone(), attachments));
        }

        let draft_installed = match draft {
            Some(draft) => {
                tracing::info!(
                    receipt_id = %draft.receipt_ref(),
                    store = %draft.store_name(),
                    items = draft.item_count(),
                    "Receipt ready for review"
                );
                self.state.review.write().await.set_current(draft);
                true
            }
            None => false,
        };

        Ok(ChatOutcome {
            reply: response.response,
            draft_installed,
        })
    }

    /// Run `edit` against the draft under review
    pub async fn edit_draft<T>(
        &self,
        edit: impl FnOnce(&mut ReceiptDraft) -> T,
    ) -> AssistResult<T> {
        let mut review = self.state.review.write().await;
        let draft = review.current_mut().ok_or(AssistError::NoActiveDraft)?;
        Ok(edit(draft))
    }

    /// Copy of the draft under review
    pub async fn current_draft(&self) -> Option<ReceiptDraft> {
        self.state.review.read().await.current().cloned()
    }

    pub async fn approve(&self) -> AssistResult<ApprovalOutcome> {
        self.reconciler.approve(&self.state).await
    }

    pub async fn discard(&self) -> bool {
        self.reconciler.discard(&self.state).await
    }

    pub async fn transcript(&self) -> Vec<ChatMessage> {
        self.state.chat.read().await.messages().to_vec()
    }

    async fn report_failure(&self, err: AssistError) -> AssistError {
        tracing::error!(error = %err, "Classification request failed");
        self.state.chat.write().await.add_message(ChatMessage::assistant(
            format!("Sorry, there was an error: {}. Please try again later.", err),
            Vec::new(),
        ));
        err
    }
}
