//! Logging and optional OpenTelemetry export

use opentelemetry_otlp::WithExportConfig;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

use crate::config::LogFormat;
use crate::error::{Error, Result};

const OTLP_ENDPOINT_VAR: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

/// Install the global subscriber
///
/// Defaults to `info`, overridable via `RUST_LOG`. Spans are exported over
/// OTLP only when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
pub fn init_tracing(format: LogFormat) -> Result<bool> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    let fmt_layer = match format {
        LogFormat::Text => fmt::layer().with_target(true).boxed(),
        LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
    };

    let otel_layer = match std::env::var(OTLP_ENDPOINT_VAR) {
        Ok(endpoint) if !endpoint.is_empty() => {
            let tracer = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(
                    opentelemetry_otlp::new_exporter()
                        .tonic()
                        .with_endpoint(endpoint),
                )
                .install_batch(opentelemetry_sdk::runtime::Tokio)
                .map_err(|e| Error::TelemetryError(e.to_string()))?;
            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
        _ => None,
    };
    let otel_enabled = otel_layer.is_some();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()
        .map_err(|e| Error::TelemetryError(e.to_string()))?;

    Ok(otel_enabled)
}

/// Flush pending spans before the process exits
pub fn shutdown_tracing() {
    opentelemetry::global::shutdown_tracer_provider();
}
