use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::config::Config;
use crate::errors::AppError;
use crate::extraction_client::{ExtractionClient, UploadedDocument};
use crate::normalizer::normalize;
use crate::presentation::{ErrorState, PresentationState};
use crate::reconciliation::{reconcile, ValidationStatus};

/// Immutable collaborators for one deployment, built once at startup and
/// shared by every request.
#[derive(Clone)]
pub struct PipelineContext {
    pub extraction_client: ExtractionClient,
}

impl PipelineContext {
    pub fn new(extraction_client: ExtractionClient) -> Self {
        Self { extraction_client }
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Ok(Self::new(ExtractionClient::from_config(config)?))
    }
}

/// Result of analyzing one document: exactly one of a full presentation
/// state or an error banner.
#[derive(Debug)]
pub enum AnalysisOutcome {
    Ready(Box<PresentationState>),
    Failed(AppError),
}

impl AnalysisOutcome {
    pub fn presentation(&self) -> Option<&PresentationState> {
        match self {
            AnalysisOutcome::Ready(state) => Some(state),
            AnalysisOutcome::Failed(_) => None,
        }
    }

    pub fn error_state(&self) -> Option<ErrorState> {
        match self {
            AnalysisOutcome::Ready(_) => None,
            AnalysisOutcome::Failed(err) => Some(err.to_error_state()),
        }
    }
}

impl IntoResponse for AnalysisOutcome {
    fn into_response(self) -> Response {
        match self {
            AnalysisOutcome::Ready(state) => (StatusCode::OK, Json(*state)).into_response(),
            AnalysisOutcome::Failed(err) => err.into_response(),
        }
    }
}

/// Runs the full pipeline for one upload.
///
/// 1. Reject a missing document without touching the network.
/// 2. Send the document to the extraction service and wait for the complete answer.
/// 3. Normalize, reconcile and assemble the presentation state.
///
/// Every failure is logged with the filename and full detail; the outcome only
/// carries the generic user-facing message.
pub async fn analyze_document(
    ctx: &PipelineContext,
    upload: Option<UploadedDocument>,
) -> AnalysisOutcome {
    let Some(document) = upload else {
        tracing::warn!("Invoice processing attempt failed: No PDF file was uploaded.");
        return AnalysisOutcome::Failed(AppError::InputMissing);
    };

    let filename = document.filename.clone();
    tracing::info!("Starting invoice processing for: {}", filename);

    let raw = match ctx.extraction_client.extract(&document).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!(
                "Request to extraction service failed for file: {}. Error: {}",
                filename,
                e
            );
            return AnalysisOutcome::Failed(e);
        }
    };
    tracing::info!("Successfully received data from webhook for: {}", filename);

    match present_payload_for(&filename, raw) {
        Ok(state) => {
            tracing::info!("Successfully completed analysis for: {}", filename);
            AnalysisOutcome::Ready(Box::new(state))
        }
        Err(e) => {
            tracing::error!(
                "Failed to parse webhook response for file: {}. Error: {}",
                filename,
                e
            );
            AnalysisOutcome::Failed(e)
        }
    }
}

/// Runs only the pure stages (normalize, reconcile, assemble) over an
/// already-received extraction response.
pub fn present_payload(raw: Value) -> Result<PresentationState, AppError> {
    present_payload_for("<payload>", raw)
}

fn present_payload_for(filename: &str, raw: Value) -> Result<PresentationState, AppError> {
    let record = normalize(&raw)?;
    let result = reconcile(&record);

    match result.status {
        ValidationStatus::Validated => tracing::info!(
            "Validation successful for {}. Invoice Total: ${}, Line Sum: ${}",
            filename,
            record.invoice_total,
            result.line_total_sum
        ),
        ValidationStatus::Mismatch => tracing::warn!(
            "Validation mismatch for {}. Invoice Total: ${}, Line Sum: ${}",
            filename,
            record.invoice_total,
            result.line_total_sum
        ),
    }

    Ok(PresentationState::assemble(&record, &result, raw))
}
