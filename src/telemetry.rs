use std::path::Path;
use std::sync::OnceLock;

use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{MetricExporter, SpanExporter};
use opentelemetry_sdk::{Resource, metrics::SdkMeterProvider, trace::SdkTracerProvider};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_opentelemetry::{MetricsLayer, OpenTelemetryLayer};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

const SERVICE_NAME: &str = "schoolscout";
const LOG_FILE: &str = "schoolscout.log";

fn get_resource() -> Resource {
    static RESOURCE: OnceLock<Resource> = OnceLock::new();
    RESOURCE
        .get_or_init(|| Resource::builder().with_service_name(SERVICE_NAME).build())
        .clone()
}

fn init_traces() -> anyhow::Result<SdkTracerProvider> {
    let exporter = SpanExporter::builder().with_http().build()?;

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(get_resource())
        .build())
}

fn init_metrics() -> anyhow::Result<SdkMeterProvider> {
    let exporter = MetricExporter::builder().with_http().build()?;

    Ok(SdkMeterProvider::builder()
        .with_periodic_exporter(exporter)
        .with_resource(get_resource())
        .build())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the console and file layers, plus OTLP export when
/// `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
///
/// Keep the returned guard alive for the whole process; dropping it flushes
/// and shuts down the exporters.
pub fn init_tracing_subscriber(log_dir: &Path) -> anyhow::Result<OtelGuard> {
    std::fs::create_dir_all(log_dir)?;
    let file_appender = RollingFileAppender::new(Rotation::NEVER, log_dir, LOG_FILE);

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(env_filter());

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(env_filter());

    let otlp_enabled = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .is_ok_and(|endpoint| !endpoint.trim().is_empty());
    let (tracer_provider, meter_provider) = if otlp_enabled {
        (Some(init_traces()?), Some(init_metrics()?))
    } else {
        (None, None)
    };

    // Option<Layer> is a no-op layer when None
    let otel_layer = tracer_provider
        .as_ref()
        .map(|provider| OpenTelemetryLayer::new(provider.tracer(SERVICE_NAME)));
    let metrics_layer = meter_provider.clone().map(MetricsLayer::new);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(metrics_layer)
        .with(otel_layer)
        .init();

    Ok(OtelGuard {
        tracer_provider,
        meter_provider,
    })
}

pub struct OtelGuard {
    tracer_provider: Option<SdkTracerProvider>,
    meter_provider: Option<SdkMeterProvider>,
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if let Some(tracer) = self.tracer_provider.take() {
            if let Err(err) = tracer.shutdown() {
                eprintln!("{err:?}");
            }
        }
        if let Some(meter) = self.meter_provider.take() {
            if let Err(err) = meter.shutdown() {
                eprintln!("{err:?}");
            }
        }
    }
}
