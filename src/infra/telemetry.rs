use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing::Subscriber;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install the global tracing subscriber. `RUST_LOG` directives refine the
/// configured level.
///
/// Logs go to stderr; stdout carries rendered output.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(stderr_layer(logging.format))
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn stderr_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    }
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "inkpost_render_total",
            Unit::Count,
            "Documents rendered by the pipeline."
        );
        describe_histogram!(
            "inkpost_render_ms",
            Unit::Milliseconds,
            "Wall time of one pipeline render."
        );
        describe_counter!(
            "inkpost_math_failures_total",
            Unit::Count,
            "Math expressions dropped because KaTeX rejected them."
        );
        describe_counter!(
            "inkpost_sanitize_fail_closed_total",
            Unit::Count,
            "Sanitiser runs that failed and returned empty output."
        );
        describe_counter!(
            "inkpost_directives_expanded_total",
            Unit::Count,
            "Directives replaced during expansion."
        );
    });
}
