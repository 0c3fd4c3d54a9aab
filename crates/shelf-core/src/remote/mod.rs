//! Catalog service client.
//!
//! Submits locally created products as multipart form posts and fetches the
//! authoritative catalog as JSON. This module never touches the local store;
//! the sync engine decides what to do with each outcome.

mod multipart;

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use thiserror::Error;

use crate::config::ShelfConfig;
use crate::models::{CatalogItem, ProductPayload};
use crate::{Error, Result};

pub use multipart::{format_decimal, product_fields, product_form};

const SUBMIT_ROUTE: &str = "/api/public/add";
const FETCH_ROUTE: &str = "/api/public/get";
const FIELD_HEADER: &str = "field";
/// Longest response body shown in an error message.
const BODY_PREVIEW_CHARS: usize = 180;

/// Why a submission did not result in acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// No response: connection failure or timeout
    #[error("Transport error: {0}")]
    Transport(String),
    /// Server-side failure (HTTP 5xx)
    #[error("Server error (HTTP {status}): {}", body_preview(.body))]
    Server { status: u16, body: String },
    /// The server refused the payload
    #[error("Rejected (HTTP {status}){}", rejection_detail(.message))]
    Rejected { status: u16, message: Option<String> },
    /// The payload could not be turned into a request body
    #[error("Failed to encode product form: {0}")]
    Encode(String),
}

fn rejection_detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|message| format!(": {}", body_preview(message)))
        .unwrap_or_default()
}

/// Shorten a response body for display. The error value keeps the full text.
pub fn body_preview(body: &str) -> String {
    if body.chars().count() <= BODY_PREVIEW_CHARS {
        return body.to_string();
    }
    let mut preview = body.chars().take(BODY_PREVIEW_CHARS).collect::<String>();
    preview.push_str("...");
    preview
}

impl SubmitError {
    /// Whether a later flush may succeed without changing the payload.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Server { .. })
    }
}

/// Why a catalog fetch produced no items.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// No response: connection failure or timeout
    #[error("Transport error: {0}")]
    Transport(String),
    /// Non-success status other than 404
    #[error("Catalog request failed with HTTP {status}: {}", body_preview(.body))]
    Status { status: u16, body: String },
    /// The body was not a valid catalog array
    #[error("Failed to decode catalog: {0}")]
    Decode(String),
}

/// Remote catalog operations the sync engine depends on.
#[allow(async_fn_in_trait)]
pub trait CatalogRemote {
    /// Submit one product. `Ok` means the server accepted it.
    async fn submit(&self, payload: &ProductPayload) -> std::result::Result<(), SubmitError>;

    /// Fetch the full catalog. A missing catalog yields an empty list.
    async fn fetch(&self) -> std::result::Result<Vec<CatalogItem>, FetchError>;
}

/// HTTP client for the public catalog API.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    base_url: String,
    client_field: String,
    submit_timeout: Duration,
    fetch_timeout: Duration,
    client: reqwest::Client,
}

impl HttpCatalogClient {
    /// Build a client from validated configuration.
    pub fn new(config: &ShelfConfig) -> Result<Self> {
        let config = config.clone().validate()?;
        let client = reqwest::Client::builder().build().map_err(|error| {
            Error::InvalidInput(format!("Failed to construct HTTP client: {error}"))
        })?;
        Ok(Self {
            submit_timeout: config.submit_timeout(),
            fetch_timeout: config.fetch_timeout(),
            base_url: config.api_base_url,
            client_field: config.client_field,
            client,
        })
    }

    /// Returns the base URL this client was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl CatalogRemote for HttpCatalogClient {
    async fn submit(&self, payload: &ProductPayload) -> std::result::Result<(), SubmitError> {
        let form =
            product_form(payload).map_err(|error| SubmitError::Encode(error.to_string()))?;
        tracing::debug!(
            "Submitting '{}' (image: {})",
            payload.name,
            payload.image.is_some()
        );

        let response = self
            .client
            .post(format!("{}{SUBMIT_ROUTE}", self.base_url))
            .header(FIELD_HEADER, &self.client_field)
            .timeout(self.submit_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|error| SubmitError::Transport(describe_transport_error(&error)))?;

        let status = response.status();
        if status == StatusCode::OK {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_submit_failure(status.as_u16(), &body))
    }

    async fn fetch(&self) -> std::result::Result<Vec<CatalogItem>, FetchError> {
        let response = self
            .client
            .get(format!("{}{FETCH_ROUTE}", self.base_url))
            .header(FIELD_HEADER, &self.client_field)
            .header(ACCEPT, "application/json")
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|error| FetchError::Transport(describe_transport_error(&error)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!("Catalog endpoint returned 404; treating as empty catalog");
            return Ok(Vec::new());
        }

        let body = response
            .text()
            .await
            .map_err(|error| FetchError::Transport(describe_transport_error(&error)))?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        parse_catalog(&body)
    }
}

/// Map a non-200 submit response to its error class. The trimmed body is
/// kept whole so the stored failure carries the server's full explanation.
pub fn classify_submit_failure(status: u16, body: &str) -> SubmitError {
    let body = body.trim().to_string();
    if (500..=599).contains(&status) {
        SubmitError::Server { status, body }
    } else {
        SubmitError::Rejected {
            status,
            message: (!body.is_empty()).then_some(body),
        }
    }
}

/// Parse a catalog response body.
pub fn parse_catalog(body: &str) -> std::result::Result<Vec<CatalogItem>, FetchError> {
    serde_json::from_str::<Vec<CatalogItem>>(body)
        .map_err(|error| FetchError::Decode(error.to_string()))
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out: {error}")
    } else {
        error.to_string()
    }
}
