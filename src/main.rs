#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use axum::routing::get;
use hris::{app, initialize_state, telemetry};
use opentelemetry::global;
use tokio::net::TcpListener;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    // Export traces and logs only when a collector is configured.
    let endpoint = std::env::var(OTLP_ENDPOINT).ok();
    let bridge = match &endpoint {
        Some(endpoint) => {
            global::set_tracer_provider(telemetry::setup_tracer(endpoint)?);
            Some(telemetry::setup_logging(endpoint)?)
        },
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hris=info,tower_http=info".into()),
        )
        .with(fmt::layer())
        .with(bridge)
        .init();

    let metrics = telemetry::setup_metrics_recorder()?;
    let state = initialize_state().await?;
    let port = state.config.port;

    let app = app(state)
        .route("/metrics", get(move || std::future::ready(metrics.render())));

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, otlp = endpoint.is_some(), "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
    }
    tracing::info!("gracefully shutdown");
}
