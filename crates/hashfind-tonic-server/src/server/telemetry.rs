//! # Telemetry
//!
//! Console logging is always on. OpenTelemetry export of spans and metrics is
//! opt-in through cargo features.
//!
//! ## Feature matrix
//!
//! - `tracing`: Enables log events and OpenTelemetry spans.
//! - `metrics`: Enables the search counters and histograms listed below.
//! - `honeycomb`: Exports over OTLP/gRPC to Honeycomb. Reads
//!   `HONEYCOMB_API_KEY`, `HONEYCOMB_DATASET`, `HONEYCOMB_ENDPOINT` and
//!   `HONEYCOMB_COMPRESSION`.
//! - `stdout`: Exports to stdout.
//!
//! Exporters need at least one of `tracing` or `metrics`. Both exporters may
//! be enabled together.
//!
//! ## Metrics
//!
//! Every metric carries an `rpc` attribute (`find` or `find_range`).
//!
//! | Name                   | Kind           | Meaning                                |
//! |------------------------|----------------|----------------------------------------|
//! | `requests`             | counter        | Accepted calls                         |
//! | `searches_inflight`    | up/down        | Searches admitted and not yet finished |
//! | `errors`               | counter        | Calls that ended with a `Status`       |
//! | `search_duration`      | histogram (ms) | Wall time of a search on its worker    |
//! | `candidates_evaluated` | counter        | Digests computed                       |
//! | `matches_emitted`      | counter        | Matches handed to clients              |
//! | `searches_cancelled`   | counter        | Searches stopped by their cancel flag  |
//!
//! ## Example usage
//!
//! ```bash
//! cargo run --features tracing,metrics,stdout
//! ```

#[cfg(all(
    feature = "honeycomb",
    not(any(feature = "tracing", feature = "metrics"))
))]
compile_error!(
    "The 'honeycomb' feature requires at least one of 'tracing' or 'metrics' to be enabled."
);

#[cfg(all(feature = "stdout", not(any(feature = "tracing", feature = "metrics"))))]
compile_error!(
    "The 'stdout' feature requires at least one of 'tracing' or 'metrics' to be enabled."
);

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(all(feature = "honeycomb", any(feature = "metrics", feature = "tracing")))]
use opentelemetry_otlp::{Compression, Protocol, WithExportConfig, WithTonicConfig};
#[cfg(all(feature = "honeycomb", feature = "metrics"))]
use opentelemetry_sdk::metrics::Temporality;
#[cfg(feature = "honeycomb")]
use tonic::metadata::MetadataMap;
#[cfg(all(feature = "honeycomb", any(feature = "metrics", feature = "tracing")))]
use tonic::transport::ClientTlsConfig;

#[cfg(feature = "metrics")]
use opentelemetry::metrics::{Counter, Histogram, Meter, UpDownCounter};
#[cfg(feature = "metrics")]
use opentelemetry_sdk::metrics as sdkmetrics;
#[cfg(feature = "metrics")]
use std::sync::OnceLock;

#[cfg(any(feature = "metrics", feature = "tracing"))]
use opentelemetry::{InstrumentationScope, KeyValue};
#[cfg(any(feature = "metrics", feature = "tracing"))]
use opentelemetry_sdk::Resource;
#[cfg(any(feature = "metrics", feature = "tracing"))]
use opentelemetry_semantic_conventions as semvcns;

#[cfg(feature = "tracing")]
use opentelemetry::trace::TracerProvider;
#[cfg(feature = "tracing")]
use opentelemetry_sdk::propagation::TraceContextPropagator;
#[cfg(feature = "tracing")]
use opentelemetry_sdk::trace as sdktrace;

const SERVICE_NAME: &str = "hashfind";

/// The gRPC method a metric is recorded for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rpc {
    Find,
    FindRange,
}

impl Rpc {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Find => "find",
            Self::FindRange => "find_range",
        }
    }
}

/// Providers that must be flushed and shut down before the process exits.
pub struct TelemetryProviders {
    #[cfg(feature = "tracing")]
    pub tracer_provider: sdktrace::SdkTracerProvider,
    #[cfg(feature = "metrics")]
    pub meter_provider: sdkmetrics::SdkMeterProvider,
}

pub fn init_telemetry() -> anyhow::Result<TelemetryProviders> {
    #[cfg(feature = "tracing")]
    opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

    #[cfg(feature = "tracing")]
    let tracer_provider = init_tracer()?;

    #[cfg(feature = "metrics")]
    let meter_provider = init_metrics()?;

    #[cfg(any(feature = "metrics", feature = "tracing"))]
    let scope = InstrumentationScope::builder(SERVICE_NAME)
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_schema_url(semvcns::SCHEMA_URL)
        .build();

    // Human-readable console output, independent of the stdout exporter.
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true)
                .pretty(),
        );

    #[cfg(feature = "tracing")]
    let registry = {
        opentelemetry::global::set_tracer_provider(tracer_provider.clone());
        registry.with(
            tracing_opentelemetry::layer()
                .with_tracer(tracer_provider.tracer_with_scope(scope.clone()))
                .with_error_records_to_exceptions(true),
        )
    };

    #[cfg(feature = "metrics")]
    let registry = {
        opentelemetry::global::set_meter_provider(meter_provider.clone());
        init_metric_handles(&opentelemetry::global::meter_with_scope(scope));
        registry.with(tracing_opentelemetry::MetricsLayer::new(
            meter_provider.clone(),
        ))
    };

    registry.init();

    Ok(TelemetryProviders {
        #[cfg(feature = "tracing")]
        tracer_provider,
        #[cfg(feature = "metrics")]
        meter_provider,
    })
}

/// Connection settings shared by the Honeycomb span and metric exporters.
#[cfg(feature = "honeycomb")]
struct Honeycomb {
    metadata: MetadataMap,
    endpoint: String,
    compression: Compression,
}

#[cfg(feature = "honeycomb")]
impl Honeycomb {
    fn from_env() -> anyhow::Result<Self> {
        use anyhow::Context;
        use std::str::FromStr;

        let api_key = std::env::var("HONEYCOMB_API_KEY").context("missing `HONEYCOMB_API_KEY`")?;
        let dataset = std::env::var("HONEYCOMB_DATASET").context("missing `HONEYCOMB_DATASET`")?;
        let endpoint =
            std::env::var("HONEYCOMB_ENDPOINT").context("missing `HONEYCOMB_ENDPOINT`")?;
        let compression = std::env::var("HONEYCOMB_COMPRESSION")
            .context("missing `HONEYCOMB_COMPRESSION`")?
            .to_ascii_lowercase();

        let mut metadata = MetadataMap::new();
        metadata.insert(
            "x-honeycomb-team",
            api_key.parse().context("invalid API key")?,
        );
        metadata.insert(
            "x-honeycomb-dataset",
            dataset.parse().context("invalid dataset")?,
        );

        Ok(Self {
            metadata,
            endpoint,
            compression: Compression::from_str(&compression)?,
        })
    }
}

#[cfg(any(feature = "metrics", feature = "tracing"))]
fn resource() -> Resource {
    Resource::builder()
        .with_service_name(SERVICE_NAME)
        .with_schema_url(
            [KeyValue::new(
                semvcns::resource::SERVICE_VERSION,
                env!("CARGO_PKG_VERSION"),
            )],
            semvcns::SCHEMA_URL,
        )
        .build()
}

#[cfg(feature = "metrics")]
fn init_metrics() -> anyhow::Result<sdkmetrics::SdkMeterProvider> {
    let builder = sdkmetrics::SdkMeterProvider::builder().with_resource(resource());

    #[cfg(feature = "stdout")]
    let builder = {
        let reader = sdkmetrics::PeriodicReader::builder(
            opentelemetry_stdout::MetricExporter::default(),
        )
        .with_interval(std::time::Duration::from_secs(5))
        .build();
        builder.with_reader(reader)
    };

    #[cfg(feature = "honeycomb")]
    let builder = {
        use anyhow::Context;

        let honeycomb = Honeycomb::from_env()?;
        let exporter = opentelemetry_otlp::MetricExporter::builder()
            .with_tonic()
            .with_tls_config(ClientTlsConfig::new().with_native_roots())
            .with_metadata(honeycomb.metadata)
            .with_timeout(std::time::Duration::from_secs(10))
            .with_compression(honeycomb.compression)
            .with_endpoint(honeycomb.endpoint)
            .with_protocol(Protocol::Grpc)
            .with_temporality(Temporality::Delta)
            .build()
            .context("failed to build metrics exporter")?;
        builder.with_periodic_exporter(exporter)
    };

    Ok(builder.build())
}

#[cfg(all(feature = "tracing", any(feature = "stdout", feature = "honeycomb")))]
fn batched<E>(exporter: E) -> sdktrace::BatchSpanProcessor
where
    E: opentelemetry_sdk::trace::SpanExporter + 'static,
{
    sdktrace::BatchSpanProcessor::builder(exporter)
        .with_batch_config(
            sdktrace::BatchConfigBuilder::default()
                .with_scheduled_delay(std::time::Duration::from_secs(5))
                .with_max_queue_size(2048)
                .build(),
        )
        .build()
}

#[cfg(feature = "tracing")]
fn init_tracer() -> anyhow::Result<sdktrace::SdkTracerProvider> {
    let builder = sdktrace::SdkTracerProvider::builder().with_resource(resource());

    #[cfg(feature = "stdout")]
    let builder =
        builder.with_span_processor(batched(opentelemetry_stdout::SpanExporter::default()));

    #[cfg(feature = "honeycomb")]
    let builder = {
        use anyhow::Context;

        let honeycomb = Honeycomb::from_env()?;
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_tls_config(ClientTlsConfig::new().with_native_roots())
            .with_metadata(honeycomb.metadata)
            .with_timeout(std::time::Duration::from_secs(10))
            .with_compression(honeycomb.compression)
            .with_endpoint(honeycomb.endpoint)
            .with_protocol(Protocol::Grpc)
            .build()
            .context("failed to build tracer exporter")?;
        builder.with_span_processor(batched(exporter))
    };

    Ok(builder.build())
}

#[cfg(feature = "metrics")]
struct Instruments {
    requests: Counter<u64>,
    searches_inflight: UpDownCounter<i64>,
    errors: Counter<u64>,
    search_duration_ms: Histogram<f64>,
    candidates_evaluated: Counter<u64>,
    matches_emitted: Counter<u64>,
    searches_cancelled: Counter<u64>,
}

#[cfg(feature = "metrics")]
static INSTRUMENTS: OnceLock<Instruments> = OnceLock::new();

#[cfg(feature = "metrics")]
fn init_metric_handles(meter: &Meter) {
    let _ = INSTRUMENTS.set(Instruments {
        requests: meter
            .u64_counter("requests")
            .with_description("Accepted search calls")
            .build(),
        searches_inflight: meter
            .i64_up_down_counter("searches_inflight")
            .with_description("Searches admitted and not yet finished")
            .build(),
        errors: meter
            .u64_counter("errors")
            .with_description("Calls that ended with an error status")
            .build(),
        search_duration_ms: meter
            .f64_histogram("search_duration")
            .with_unit("ms")
            .with_description("Wall time of a search on its worker")
            .build(),
        candidates_evaluated: meter
            .u64_counter("candidates_evaluated")
            .with_description("Candidate digests computed")
            .build(),
        matches_emitted: meter
            .u64_counter("matches_emitted")
            .with_description("Matches handed to clients")
            .build(),
        searches_cancelled: meter
            .u64_counter("searches_cancelled")
            .with_description("Searches stopped by their cancel flag")
            .build(),
    });
}

#[cfg(feature = "metrics")]
fn with_instruments(rpc: Rpc, record: impl FnOnce(&Instruments, &[KeyValue])) {
    if let Some(instruments) = INSTRUMENTS.get() {
        record(instruments, &[KeyValue::new("rpc", rpc.as_str())]);
    }
}

// Each recorder compiles to a no-op without the `metrics` feature.

#[cfg(feature = "metrics")]
pub fn increment_requests(rpc: Rpc) {
    with_instruments(rpc, |i, attrs| i.requests.add(1, attrs));
}

#[cfg(not(feature = "metrics"))]
pub fn increment_requests(_rpc: Rpc) {}

#[cfg(feature = "metrics")]
pub fn increment_searches_inflight(rpc: Rpc) {
    with_instruments(rpc, |i, attrs| i.searches_inflight.add(1, attrs));
}

#[cfg(not(feature = "metrics"))]
pub fn increment_searches_inflight(_rpc: Rpc) {}

#[cfg(feature = "metrics")]
pub fn decrement_searches_inflight(rpc: Rpc) {
    with_instruments(rpc, |i, attrs| i.searches_inflight.add(-1, attrs));
}

#[cfg(not(feature = "metrics"))]
pub fn decrement_searches_inflight(_rpc: Rpc) {}

#[cfg(feature = "metrics")]
pub fn increment_errors(rpc: Rpc) {
    with_instruments(rpc, |i, attrs| i.errors.add(1, attrs));
}

#[cfg(not(feature = "metrics"))]
pub fn increment_errors(_rpc: Rpc) {}

#[cfg(feature = "metrics")]
pub fn record_search_duration(rpc: Rpc, duration_ms: f64) {
    with_instruments(rpc, |i, attrs| i.search_duration_ms.record(duration_ms, attrs));
}

#[cfg(not(feature = "metrics"))]
pub fn record_search_duration(_rpc: Rpc, _duration_ms: f64) {}

#[cfg(feature = "metrics")]
pub fn increment_candidates_evaluated(rpc: Rpc, count: u64) {
    with_instruments(rpc, |i, attrs| i.candidates_evaluated.add(count, attrs));
}

#[cfg(not(feature = "metrics"))]
pub fn increment_candidates_evaluated(_rpc: Rpc, _count: u64) {}

#[cfg(feature = "metrics")]
pub fn increment_matches_emitted(rpc: Rpc, count: u64) {
    with_instruments(rpc, |i, attrs| i.matches_emitted.add(count, attrs));
}

#[cfg(not(feature = "metrics"))]
pub fn increment_matches_emitted(_rpc: Rpc, _count: u64) {}

#[cfg(feature = "metrics")]
pub fn increment_searches_cancelled(rpc: Rpc) {
    with_instruments(rpc, |i, attrs| i.searches_cancelled.add(1, attrs));
}

#[cfg(not(feature = "metrics"))]
pub fn increment_searches_cancelled(_rpc: Rpc) {}
