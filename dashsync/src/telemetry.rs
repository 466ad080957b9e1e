use crate::config::{Config, LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::StatsdBuilder;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_LEVEL: &str = "info";
const METRICS_PREFIX: &str = "dashsync";

#[derive(thiserror::Error, Debug)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    InvalidFilter(#[from] tracing_subscriber::filter::ParseError),
    #[error("could not install log subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
    #[error("could not build statsd exporter: {0}")]
    Statsd(#[from] metrics_exporter_statsd::StatsdError),
    #[error("a metrics recorder is already installed")]
    RecorderAlreadySet,
}

/// Installs logging, Sentry and metrics as configured.
///
/// The returned guard flushes Sentry on drop and must be held until exit.
pub fn init(config: &Config) -> Result<Option<sentry::ClientInitGuard>, TelemetryError> {
    let guard = init_logging(config.logging.as_ref())?;

    if let Some(metrics) = &config.metrics {
        init_metrics(metrics)?;
        tracing::info!(
            host = %metrics.statsd_host,
            port = metrics.statsd_port,
            "Sending metrics to statsd"
        );
    }

    Ok(guard)
}

fn init_logging(
    logging: Option<&LoggingConfig>,
) -> Result<Option<sentry::ClientInitGuard>, TelemetryError> {
    let level = logging
        .and_then(|l| l.level.as_deref())
        .unwrap_or(DEFAULT_LEVEL);
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)?,
    };

    let guard = logging
        .and_then(|l| l.sentry_dsn.as_deref())
        .map(|dsn| {
            sentry::init((
                dsn,
                sentry::ClientOptions {
                    release: sentry::release_name!(),
                    ..Default::default()
                },
            ))
        });
    let sentry_layer = guard
        .as_ref()
        .map(|_| sentry::integrations::tracing::layer());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(sentry_layer)
        .try_init()?;

    Ok(guard)
}

fn init_metrics(metrics: &MetricsConfig) -> Result<(), TelemetryError> {
    let recorder = StatsdBuilder::from(metrics.statsd_host.clone(), metrics.statsd_port)
        .build(Some(METRICS_PREFIX))?;
    metrics::set_global_recorder(recorder).map_err(|_| TelemetryError::RecorderAlreadySet)?;
    shared::metrics_defs::describe_all(engine::metrics_defs::ALL_METRICS);
    Ok(())
}
