//! # Payments Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize logging and optional OTLP trace export
//! - Build the remote clients (auth service, user service, Midtrans)
//! - Initialize the repository adapter and the payment service
//! - Start the HTTP server

mod config;

use std::sync::Arc;

use opentelemetry::global;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace as sdktrace};
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

use config::{Config, LogFormat};
use payments_hex::outbound::{HttpAuthorityService, HttpUserDirectory, MidtransGateway};
use payments_hex::{LifecycleSettings, PaymentService, inbound::HttpServer};
use payments_repo::build_repo;

fn init_tracer(endpoint: &str) -> anyhow::Result<(sdktrace::Tracer, sdktrace::SdkTracerProvider)> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    // gRPC exporter with batch processing (non-blocking)
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();

    global::set_tracer_provider(provider.clone());

    use opentelemetry::trace::TracerProvider as _;
    Ok((provider.tracer("payments-service"), provider))
}

/// Installs the global subscriber; returns the trace provider when OTLP export is on.
fn init_telemetry(config: &Config) -> anyhow::Result<Option<sdktrace::SdkTracerProvider>> {
    let (telemetry, provider) = match config.otlp_endpoint.as_deref() {
        Some(endpoint) => {
            let (tracer, provider) = init_tracer(endpoint)?;
            (
                Some(tracing_opentelemetry::layer().with_tracer(tracer)),
                Some(provider),
            )
        }
        None => (None, None),
    };

    let fmt = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,payments_app=debug,payments_hex=debug".into()),
        )
        .with(fmt)
        .with(telemetry)
        .init();

    Ok(provider)
}

/// Database scheme only; the URL may carry credentials.
fn database_kind(url: &str) -> &str {
    url.split(':').next().unwrap_or("unknown")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let otel_provider = init_telemetry(&config)?;

    tracing::info!("Starting payments server on port {}", config.port);
    tracing::info!(
        database = database_kind(&config.database_url),
        midtrans_env = ?config.midtrans_env,
        "configuration loaded"
    );

    // Remote collaborators
    let timeout = config.http_client_timeout;
    let authority = Arc::new(HttpAuthorityService::new(&config.auth_service_url, timeout)?);
    let users = Arc::new(HttpUserDirectory::new(&config.user_service_url, timeout)?);
    let gateway = Arc::new(MidtransGateway::new(
        config.midtrans_server_key.clone(),
        config.midtrans_env,
        timeout,
    )?);

    let settings = LifecycleSettings {
        finish_url: config.midtrans_finish_url.clone(),
        webhook_server_key: config.webhook_server_key(),
    };
    if settings.webhook_server_key.is_none() {
        tracing::warn!("gateway notification signatures are NOT verified");
    }

    // Build repository (handles connection and migration)
    let repo = build_repo(&config.database_url).await?;

    let service = PaymentService::new(repo, users, gateway, settings);

    let server = HttpServer::with_rate_limit(service, authority, config.rate_limit_per_minute);
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    // Ensure traces are flushed before exit
    if let Some(provider) = otel_provider {
        let _ = provider.shutdown();
    }
    Ok(())
}
