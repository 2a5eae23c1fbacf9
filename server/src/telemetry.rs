//! Logging and optional OpenTelemetry export.
//!
//! Console logging is always on (`RUST_LOG` filters it). If
//! `OTEL_EXPORTER_OTLP_ENDPOINT` is set and a collector answers there, traces
//! and logs are also exported over OTLP.

use anyhow::anyhow;
use opentelemetry::trace::TracerProvider;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::env;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_SERVICE_NAME: &str = "potluck-server";
const DEFAULT_FILTER: &str = "info";

struct Providers {
    tracer: SdkTracerProvider,
    logger: SdkLoggerProvider,
}

/// Flushes exporters when dropped. Hold it for the life of the process.
pub struct TelemetryGuard {
    providers: Option<Providers>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(providers) = self.providers.take() {
            let _ = providers.tracer.shutdown();
            let _ = providers.logger.shutdown();
        }
    }
}

enum ExportStatus {
    NotConfigured,
    Unreachable(String),
    Failed(String, String),
    Enabled(String),
}

/// Quick TCP check to see if the collector is up (resolve hostname first)
fn is_reachable(endpoint: &str) -> bool {
    let host_port = endpoint
        .trim_start_matches("http://")
        .trim_start_matches("https://")
        .trim_end_matches('/');

    host_port
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .map(|addr| TcpStream::connect_timeout(&addr, Duration::from_millis(100)).is_ok())
        .unwrap_or(false)
}

fn build_providers(endpoint: &str, service_name: &str) -> anyhow::Result<Providers> {
    let resource = opentelemetry_sdk::Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    let trace_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| anyhow!("failed to create OTLP trace exporter: {e}"))?;

    let tracer = SdkTracerProvider::builder()
        .with_batch_exporter(trace_exporter)
        .with_resource(resource.clone())
        .build();

    let log_exporter = opentelemetry_otlp::LogExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| anyhow!("failed to create OTLP log exporter: {e}"))?;

    let logger = SdkLoggerProvider::builder()
        .with_batch_exporter(log_exporter)
        .with_resource(resource)
        .build();

    Ok(Providers { tracer, logger })
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_telemetry() -> TelemetryGuard {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let fmt_layer = tracing_subscriber::fmt::layer();

    let service_name =
        env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| DEFAULT_SERVICE_NAME.to_string());

    let (providers, status) = match env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok() {
        None => (None, ExportStatus::NotConfigured),
        Some(endpoint) if !is_reachable(&endpoint) => (None, ExportStatus::Unreachable(endpoint)),
        Some(endpoint) => match build_providers(&endpoint, &service_name) {
            Ok(providers) => (Some(providers), ExportStatus::Enabled(endpoint)),
            Err(e) => (None, ExportStatus::Failed(endpoint, e.to_string())),
        },
    };

    let otel_trace_layer = providers.as_ref().map(|p| {
        tracing_opentelemetry::layer().with_tracer(p.tracer.tracer(DEFAULT_SERVICE_NAME))
    });
    let otel_log_layer = providers
        .as_ref()
        .map(|p| OpenTelemetryTracingBridge::new(&p.logger));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_trace_layer)
        .with(otel_log_layer)
        .init();

    if let Some(p) = &providers {
        opentelemetry::global::set_tracer_provider(p.tracer.clone());
    }

    match status {
        ExportStatus::NotConfigured => {
            tracing::debug!("OTEL_EXPORTER_OTLP_ENDPOINT not set, using console logging only")
        }
        ExportStatus::Unreachable(endpoint) => tracing::info!(
            "OpenTelemetry endpoint {} not reachable, using console logging only",
            endpoint
        ),
        ExportStatus::Failed(endpoint, error) => tracing::warn!(
            %error,
            "OpenTelemetry export to {} could not be set up, using console logging only",
            endpoint
        ),
        ExportStatus::Enabled(endpoint) => tracing::info!(
            "OpenTelemetry enabled, exporting traces and logs to {} as {}",
            endpoint,
            service_name
        ),
    }

    TelemetryGuard { providers }
}
