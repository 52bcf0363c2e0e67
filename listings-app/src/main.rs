//! # Listings Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize the repository and M-Pesa gateway adapters
//! - Create the featured-listing service and its expiry sweeper
//! - Start the HTTP server

mod config;

use std::sync::Arc;

use opentelemetry::global;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace as sdktrace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use listings_hex::{ExpirySweeper, FeaturedListingService, inbound::HttpServer};
use listings_repo::build_repo;
use mpesa_gateway::MpesaGateway;

fn init_tracer() -> anyhow::Result<(sdktrace::Tracer, sdktrace::SdkTracerProvider)> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    // Use gRPC exporter with batch processing (non-blocking)
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()?;

    let provider = sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();

    global::set_tracer_provider(provider.clone());

    use opentelemetry::trace::TracerProvider as _;
    Ok((provider.tracer("listings-service"), provider))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // OpenTelemetry export only when a collector is configured
    let otel = if std::env::var_os("OTEL_EXPORTER_OTLP_ENDPOINT").is_some() {
        Some(init_tracer()?)
    } else {
        None
    };
    let telemetry = otel
        .as_ref()
        .map(|(tracer, _)| tracing_opentelemetry::layer().with_tracer(tracer.clone()));

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,listings_app=debug,listings_hex=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(telemetry)
        .init();

    // Load configuration
    let config = config::Config::from_env()?;

    tracing::info!("Starting listings server on port {}", config.port);
    tracing::debug!(?config, "Loaded configuration");

    // Build repository (handles connection and migration)
    let repo = build_repo(&config.database_url).await?;

    let gateway = MpesaGateway::new(config.mpesa.clone())?;
    tracing::info!(
        base_url = %config.mpesa.base_url,
        callback_url = %config.mpesa.callback_url(),
        "M-Pesa gateway configured"
    );

    let service = Arc::new(
        FeaturedListingService::new(repo, gateway).with_expiry_window(config.expiry_window),
    );

    // Expire charges the provider never answered
    let sweeper = ExpirySweeper::new(Arc::clone(&service), config.sweep_interval);
    let sweeper_handle = tokio::spawn(sweeper.run());

    // Create and run the HTTP server
    let server = HttpServer::new(service, &config.admin_api_key);
    let addr = format!("0.0.0.0:{}", config.port);

    let result = server.run(&addr).await;

    sweeper_handle.abort();

    // Ensure traces are flushed before exit
    if let Some((_, provider)) = otel {
        let _ = provider.shutdown();
    }

    result
}
