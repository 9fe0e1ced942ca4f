use std::io;
use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Logs go to stderr so `timeline` output on stdout stays clean.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

const COUNTERS: &[(&str, &str)] = &[
    ("approvals_timeline_fetch_total", "Completed timeline fetches."),
    ("approvals_timeline_fetch_error_total", "Timeline fetches that failed."),
    (
        "approvals_timeline_stale_discard_total",
        "Fetch results discarded because a newer fetch had landed.",
    ),
    ("approvals_user_lookup_hit_total", "User lookups served from cache."),
    ("approvals_user_lookup_miss_total", "User lookups that went to the backend."),
];

/// Register descriptions for every metric the console emits.
fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        for &(name, description) in COUNTERS {
            describe_counter!(name, Unit::Count, description);
        }
        describe_gauge!(
            "approvals_timeline_pollers",
            Unit::Count,
            "Request timelines currently being polled."
        );
    });
}
