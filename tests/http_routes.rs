/// HTTP route tests
/// Drives the router in-process with tower's `oneshot` and a mocked extraction webhook
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::Engine;
use invoice_intel_api::config::{BasicCredentials, Config};
use invoice_intel_api::handlers::AppState;
use invoice_intel_api::pipeline::PipelineContext;
use invoice_intel_api::routes;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const BOUNDARY: &str = "----invoice-intel-test-boundary";

fn test_config(webhook_base: &str, app_auth: Option<BasicCredentials>) -> Config {
    Config {
        port: 8000,
        extraction_webhook_url: format!("{}/webhook", webhook_base),
        bearer_token: "test_token".to_string(),
        app_auth,
        upstream_timeout_secs: 5,
        max_upload_mb: 1,
    }
}

fn test_app(config: Config) -> Router {
    let pipeline = PipelineContext::from_config(&config).unwrap();
    let max_upload_bytes = config.max_upload_bytes();
    let state = Arc::new(AppState { config, pipeline });
    routes::build_app(state, routes::api_router(max_upload_bytes))
}

fn multipart_body(field: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(field: &str, content: &[u8], auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/invoices/analyze")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(user_pass) = auth {
        let encoded = base64::engine::general_purpose::STANDARD.encode(user_pass);
        builder = builder.header(header::AUTHORIZATION, format!("Basic {}", encoded));
    }
    builder
        .body(Body::from(multipart_body(field, "invoice.pdf", content)))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let mock_server = MockServer::start().await;
    let app = test_app(test_config(&mock_server.uri(), None));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_analyze_returns_presentation_state() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": {"content": {
                "invoice_number": "A-77",
                "invoice_total": "75.00",
                "service_locations": [{"line_items": [{"total": "75"}]}]
            }}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = test_app(test_config(&mock_server.uri(), None));
    let response = app
        .oneshot(upload_request("file", b"%PDF-1.7", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["header"]["invoiceNumber"], "A-77");
    assert_eq!(body["validationBadge"], "VALIDATED");
    assert!(body.get("errorMessage").is_none());
}

#[tokio::test]
async fn test_missing_file_field_is_input_missing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let app = test_app(test_config(&mock_server.uri(), None));
    let response = app
        .oneshot(upload_request("attachment", b"%PDF-1.7", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["errorMessage"], "Please upload a PDF file.");
}

#[tokio::test]
async fn test_upstream_failure_returns_generic_banner() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("n8n is down: stack trace ..."))
        .mount(&mock_server)
        .await;

    let app = test_app(test_config(&mock_server.uri(), None));
    let response = app
        .oneshot(upload_request("file", b"%PDF-1.7", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body, serde_json::json!({"errorMessage": "A network error occurred."}));
}

#[tokio::test]
async fn test_basic_auth_required_when_configured() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&mock_server)
        .await;

    let creds = BasicCredentials {
        user: "analyst".to_string(),
        password: "s3cret".to_string(),
    };
    let app = test_app(test_config(&mock_server.uri(), Some(creds)));

    let denied = app
        .clone()
        .oneshot(upload_request("file", b"%PDF-1.7", None))
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

    let allowed = app
        .oneshot(upload_request("file", b"%PDF-1.7", Some("analyst:s3cret")))
        .await
        .unwrap();
    assert_eq!(allowed.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_non_multipart_request_is_bad_request() {
    let mock_server = MockServer::start().await;
    let app = test_app(test_config(&mock_server.uri(), None));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/invoices/analyze")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["errorMessage"].is_string());
}
