//! Remote classification/approval service client
//!
//! Single chokepoint for outbound calls. Each call:
//! - logs method and target before dispatch, status and target on completion
//! - maps failures onto the [`AssistError`] remote classes
//! - runs inside the bounded retry wrapper

use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

use crate::error::{AssistError, AssistResult, ValidationFailure};
use crate::models::{ApproveRequest, ApproveResponse, ChatRequest, ChatResponse, LedgerItem};
use crate::services::file_validator::FileAttachment;
use crate::utils::{retry_with_delay, RetryPolicy};

const USER_AGENT: &str = concat!("hsa-assist/", env!("CARGO_PKG_VERSION"));
const CHAT_PATH: &str = "chat";
const REVIEW_PATH: &str = "review";

/// Calls the assistant makes to the remote service
#[async_trait]
pub trait ReceiptService: Send + Sync {
    /// Send a chat message, optionally with receipt files, for classification
    async fn send_classification(
        &self,
        text: &str,
        files: &[FileAttachment],
        session_ref: &str,
        user_ref: &str,
    ) -> AssistResult<ChatResponse>;

    /// Submit the reviewed receipt; returns the authoritative ledger items
    async fn submit_approval(&self, payload: &ApproveRequest) -> AssistResult<Vec<LedgerItem>>;
}

/// Connection settings for [`RequestClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Upper bound for one attempt
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    /// Build from bootstrap configuration and an already resolved base URL
    pub fn from_toml(base_url: String, toml: &hsa_common::config::TomlConfig) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(toml.service.timeout_secs),
            retry: RetryPolicy::new(
                toml.service.retry_attempts,
                hsa_common::time::millis_to_duration(toml.service.retry_delay_ms),
            ),
        }
    }
}

/// HTTP implementation of [`ReceiptService`]
pub struct RequestClient {
    http_client: reqwest::Client,
    chat_url: Url,
    review_url: Url,
    retry: RetryPolicy,
}

impl RequestClient {
    pub fn new(config: ClientConfig) -> AssistResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| AssistError::RequestConfiguration(e.to_string()))?;

        Ok(Self {
            http_client,
            chat_url: endpoint(&config.base_url, CHAT_PATH)?,
            review_url: endpoint(&config.base_url, REVIEW_PATH)?,
            retry: config.retry,
        })
    }

    /// One attempt: POST `body` as JSON and decode the JSON reply
    async fn post_json<B, R>(&self, url: &Url, body: &B) -> AssistResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self
            .http_client
            .request(Method::POST, url.clone())
            .json(body)
            .build()
            .map_err(|e| AssistError::RequestConfiguration(e.to_string()))?;

        tracing::info!(method = %request.method(), target = %request.url(), "HTTP request");

        let response = self.http_client.execute(request).await?;
        let status = response.status();

        tracing::info!(status = status.as_u16(), target = %url, "HTTP response");

        if !status.is_success() {
            match response.text().await {
                Ok(body) => tracing::warn!(
                    status = status.as_u16(),
                    target = %url,
                    body = %body,
                    "HTTP error status"
                ),
                Err(e) => {
                    tracing::warn!(status = status.as_u16(), target = %url, "HTTP error status");
                    tracing::debug!(error = %e, "Failed to read error body");
                }
            }
            return Err(AssistError::from_status(status.as_u16()));
        }

        // Body read failures are transport errors; only the decode is not
        let bytes = response.bytes().await?;
        serde_json::from_slice::<R>(&bytes).map_err(|e| AssistError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ReceiptService for RequestClient {
    async fn send_classification(
        &self,
        text: &str,
        files: &[FileAttachment],
        session_ref: &str,
        user_ref: &str,
    ) -> AssistResult<ChatResponse> {
        if session_ref.trim().is_empty() {
            return Err(ValidationFailure::EmptyIdentity("session id").into());
        }
        if user_ref.trim().is_empty() {
            return Err(ValidationFailure::EmptyIdentity("user id").into());
        }

        // Encode once; every attempt sends the same body
        let request = ChatRequest {
            text: text.to_string(),
            files: files.iter().map(FileAttachment::to_image_data).collect(),
            session_id: session_ref.to_string(),
            user_id: user_ref.to_string(),
        };

        tracing::debug!(
            files = request.files.len(),
            session_id = %request.session_id,
            "Sending classification request"
        );

        retry_with_delay("classification", &self.retry, || {
            self.post_json::<_, ChatResponse>(&self.chat_url, &request)
        })
        .await
    }

    async fn submit_approval(&self, payload: &ApproveRequest) -> AssistResult<Vec<LedgerItem>> {
        tracing::debug!(
            receipt_id = %payload.receipt_id,
            eligible = payload.approved_hsa_eligible_items.len(),
            non_eligible = payload.approved_non_hsa_eligible_items.len(),
            unsure = payload.approved_unsure_hsa_items.len(),
            "Submitting approval"
        );

        let response: ApproveResponse = retry_with_delay("approval", &self.retry, || {
            self.post_json(&self.review_url, payload)
        })
        .await?;

        Ok(response.items)
    }
}

/// `base_url` + `/` + `path`, tolerant of a trailing slash on the base
fn endpoint(base_url: &str, path: &str) -> AssistResult<Url> {
    let joined = format!("{}/{}", base_url.trim_end_matches('/'), path);
    let url = Url::parse(&joined)
        .map_err(|e| AssistError::RequestConfiguration(format!("{}: {}", joined, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AssistError::RequestConfiguration(format!(
            "unsupported URL scheme '{}' in {}",
            other, joined
        ))),
    }
}
