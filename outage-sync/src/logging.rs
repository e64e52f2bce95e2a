//! Process-wide logging, error reporting and metrics setup. Called once from
//! `main` before anything else runs.

use crate::config::{LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::StatsdBuilder;
use shared::metrics_defs::describe_all;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const METRICS_PREFIX: &str = "outage_sync";

#[derive(thiserror::Error, Debug)]
pub enum ObservabilityError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("could not install log subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
    #[error("invalid sentry DSN: {0}")]
    SentryDsn(#[from] sentry::types::ParseDsnError),
    #[error("could not set up statsd exporter: {0}")]
    Statsd(#[from] metrics_exporter_statsd::StatsdError),
    #[error("a metrics recorder is already installed")]
    RecorderAlreadySet,
}

/// Keeps the Sentry client alive. Events still queued are flushed when it is
/// dropped at the end of `main`.
pub struct ObservabilityGuard {
    _sentry: Option<sentry::ClientInitGuard>,
}

pub fn init(
    logging: &LoggingConfig,
    metrics: Option<&MetricsConfig>,
) -> Result<ObservabilityGuard, ObservabilityError> {
    let sentry = match logging.sentry_dsn.as_deref() {
        Some(dsn) => Some(init_sentry(dsn)?),
        None => None,
    };

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level)?,
    };
    let sentry_layer = sentry
        .as_ref()
        .map(|_| sentry::integrations::tracing::layer());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(sentry_layer)
        .try_init()?;

    if let Some(metrics) = metrics {
        init_metrics(metrics)?;
    }

    Ok(ObservabilityGuard { _sentry: sentry })
}

fn init_sentry(dsn: &str) -> Result<sentry::ClientInitGuard, ObservabilityError> {
    let dsn: sentry::types::Dsn = dsn.parse()?;
    Ok(sentry::init(sentry::ClientOptions {
        dsn: Some(dsn),
        release: sentry::release_name!(),
        ..Default::default()
    }))
}

fn init_metrics(config: &MetricsConfig) -> Result<(), ObservabilityError> {
    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some(METRICS_PREFIX))?;
    metrics::set_global_recorder(recorder).map_err(|_| ObservabilityError::RecorderAlreadySet)?;

    describe_all(site_api::metrics_defs::ALL_METRICS);
    describe_all(crate::metrics_defs::ALL_METRICS);

    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "Sending metrics to statsd"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_LOG_LEVEL;

    #[test]
    fn default_level_is_a_valid_filter() {
        assert!(EnvFilter::try_new(DEFAULT_LOG_LEVEL).is_ok());
    }

    #[test]
    fn invalid_sentry_dsn_fails_before_installing_anything() {
        let logging = LoggingConfig {
            sentry_dsn: Some("not a dsn".into()),
            ..Default::default()
        };
        let result = init(&logging, None);
        assert!(matches!(result, Err(ObservabilityError::SentryDsn(_))));
    }
}
