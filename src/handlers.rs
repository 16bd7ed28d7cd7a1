use crate::config::{BasicCredentials, Config};
use crate::errors::AppError;
use crate::extraction_client::UploadedDocument;
use crate::pipeline::{analyze_document, AnalysisOutcome, PipelineContext};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::Engine;
use serde_json::json;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Upstream collaborators used by the analysis pipeline.
    pub pipeline: PipelineContext,
}

/// Health check endpoint.
///
/// # Returns
///
/// * `(StatusCode, Json<serde_json::Value>)` - HTTP 200 OK with health status JSON.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "invoice-intel-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /api/v1/invoices/analyze
///
/// Accepts a multipart upload with the invoice in the `file` field, sends it
/// to the extraction service and returns the reconciled presentation state.
///
/// # Returns
///
/// * `200` with the presentation state, or an `{"errorMessage": ...}` body with
///   400 (no document / unreadable upload), 401 (bad credentials) or 502
///   (extraction service unreachable or its answer unusable).
pub async fn analyze_invoice(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("analyze_invoice", %request_id);

    async move {
        if let Err(e) = validate_basic_auth(state.config.app_auth.as_ref(), &headers) {
            return e.into_response();
        }

        let upload = match multipart {
            Ok(mut multipart) => match read_upload(&mut multipart).await {
                Ok(upload) => upload,
                Err(e) => {
                    tracing::warn!("Could not read upload: {}", e);
                    return e.into_response();
                }
            },
            Err(rejection) => {
                tracing::warn!("Rejected non-multipart upload: {}", rejection);
                return AppError::BadRequest(rejection.to_string()).into_response();
            }
        };

        let outcome = analyze_document(&state.pipeline, upload).await;
        if let AnalysisOutcome::Failed(ref e) = outcome {
            tracing::debug!("Returning error banner for {}", e);
        }
        outcome.into_response()
    }
    .instrument(span)
    .await
}

/// Pulls the `file` part out of the multipart body.
///
/// Returns `Ok(None)` when no part is named `file` or the part is empty.
async fn read_upload(multipart: &mut Multipart) -> Result<Option<UploadedDocument>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(base_name)
            .unwrap_or_else(|| "upload.pdf".to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

        if bytes.is_empty() {
            tracing::debug!("Upload field `file` was present but empty");
            return Ok(None);
        }
        return Ok(Some(UploadedDocument::new(filename, bytes.to_vec())));
    }

    Ok(None)
}

/// Strips any client-side directory components from an uploaded filename.
fn base_name(raw: &str) -> String {
    let trimmed = raw.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(raw);
    if trimmed.is_empty() {
        "upload.pdf".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Validate HTTP Basic credentials when the deployment configures them.
fn validate_basic_auth(
    expected: Option<&BasicCredentials>,
    headers: &HeaderMap,
) -> Result<(), AppError> {
    // No credentials configured: the endpoint is open (warned at startup)
    let Some(expected) = expected else {
        return Ok(());
    };

    let encoded = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
        .ok_or_else(|| AppError::Unauthorized("Missing Basic Authorization header".to_string()))?;

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or_else(|| AppError::Unauthorized("Malformed Basic credentials".to_string()))?;

    let (user, password) = decoded
        .split_once(':')
        .ok_or_else(|| AppError::Unauthorized("Malformed Basic credentials".to_string()))?;

    // Evaluate both comparisons so the timing does not reveal which one failed
    let user_ok = constant_time_compare(user, &expected.user);
    let password_ok = constant_time_compare(password, &expected.password);
    if !(user_ok & password_ok) {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    Ok(())
}

/// Constant-time string comparison (basic implementation)
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.as_bytes()
        .iter()
        .zip(b.as_bytes().iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
