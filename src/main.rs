use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use invoice_intel_api::config::Config;
use invoice_intel_api::handlers::AppState;
use invoice_intel_api::pipeline::PipelineContext;
use invoice_intel_api::routes;

/// Main entry point for the application.
///
/// Initializes logging, loads configuration, builds the pipeline context
/// (extraction client) once, and serves the HTTP API.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "invoice_intel_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let pipeline = PipelineContext::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize extraction client: {}", e))?;
    tracing::info!(
        "✓ Extraction client initialized: {} (timeout {}s)",
        config.extraction_webhook_url,
        config.upstream_timeout_secs
    );

    let app_state = Arc::new(AppState {
        config: config.clone(),
        pipeline,
    });

    // Each analysis holds an upstream call for up to the timeout: one new
    // request per 2 seconds per IP, burst of 5
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(2)
            .burst_size(5)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    let api = routes::api_router(config.max_upload_bytes()).layer(
        ServiceBuilder::new().layer(GovernorLayer {
            config: governor_conf,
        }),
    );
    let app = routes::build_app(app_state, api);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
