//! OpenTelemetry wiring for branches that ship traces to a collector.
//!
//! Compiled out unless the `telemetry` feature is on; at runtime it
//! also stays dormant until `OTEL_EXPORTER_OTLP_ENDPOINT` is set, so a
//! stock kiosk install never opens an exporter socket.
//!
//! Environment:
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: collector address (e.g., http://localhost:4317)
//! - `OTEL_SERVICE_NAME`: reported service name (default: loketd)

use anyhow::Result;

pub fn init_telemetry() -> Result<()> {
    if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_err() {
        tracing::debug!("OTEL_EXPORTER_OTLP_ENDPOINT not set, tracing stays local");
        return Ok(());
    }

    #[cfg(feature = "telemetry")]
    {
        install_otlp()?;
    }

    #[cfg(not(feature = "telemetry"))]
    {
        tracing::warn!("OTLP endpoint configured but this build lacks the 'telemetry' feature");
        tracing::warn!("Rebuild with: cargo build --features telemetry");
    }

    Ok(())
}

#[cfg(feature = "telemetry")]
fn install_otlp() -> Result<()> {
    use opentelemetry::trace::TracerProvider;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::Tracer;

    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")?;
    let service_name = std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "loketd".to_string());

    tracing::info!(service_name = %service_name, endpoint = %endpoint, "Installing OTLP exporter");

    let tracer: Tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(&endpoint),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio)?
        .tracer(service_name);

    use tracing_subscriber::layer::SubscriberExt;
    let subscriber =
        tracing_subscriber::registry().with(tracing_opentelemetry::layer().with_tracer(tracer));
    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!("OpenTelemetry span export active");

    Ok(())
}
