use crate::config::Config;
use crate::errors::AppError;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::time::Duration;

/// A document received from the uploader.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

/// Client for the upstream extraction webhook.
///
/// Posts the document as multipart form data with a bearer token and hands
/// back the JSON it answers with. The whole exchange is bounded by a single
/// timeout; nothing is retried.
#[derive(Clone)]
pub struct ExtractionClient {
    client: reqwest::Client,
    webhook_url: String,
    token: String,
}

impl ExtractionClient {
    /// Creates a new `ExtractionClient`.
    ///
    /// # Arguments
    ///
    /// * `webhook_url` - Endpoint of the extraction service.
    /// * `token` - Bearer token sent with every request.
    /// * `timeout` - Upper bound for one complete request/response exchange.
    pub fn new(webhook_url: String, token: String, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create extraction client: {}", e)))?;

        Ok(Self {
            client,
            webhook_url,
            token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            config.extraction_webhook_url.clone(),
            config.bearer_token.clone(),
            config.upstream_timeout(),
        )
    }

    /// Sends a document for extraction.
    ///
    /// # Returns
    ///
    /// * `Ok(Value)` - The complete decoded response body.
    /// * `Err(AppError::UpstreamTransport)` - Network failure, timeout or non-2xx status.
    /// * `Err(AppError::ResponseParse)` - The body was received but is not JSON.
    pub async fn extract(&self, document: &UploadedDocument) -> Result<Value, AppError> {
        tracing::debug!(
            "Posting {} ({} bytes) to extraction service",
            document.filename,
            document.bytes.len()
        );

        let part = Part::bytes(document.bytes.clone())
            .file_name(document.filename.clone())
            .mime_str("application/pdf")
            .map_err(|e| AppError::Internal(format!("Invalid upload MIME type: {}", e)))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&self.webhook_url)
            .header("Authorization", format!("Bearer {}", self.token))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                AppError::UpstreamTransport(format!("Extraction request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::UpstreamTransport(format!(
                "Extraction service returned {}: {}",
                status, error_text
            )));
        }

        // Read the whole body before decoding; a timeout here is still a transport failure.
        let body = response.bytes().await.map_err(|e| {
            AppError::UpstreamTransport(format!("Failed to read extraction response: {}", e))
        })?;

        serde_json::from_slice(&body).map_err(|e| {
            AppError::ResponseParse(format!("Extraction response is not valid JSON: {}", e))
        })
    }
}
