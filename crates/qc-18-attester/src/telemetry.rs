//! Log subscriber setup.
//!
//! `RUST_LOG` wins over the configured level so operators can raise
//! verbosity without touching config.

use crate::config::LoggingConfig;
use crate::error::{AttesterError, AttesterResult};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter used by [`init_logging`].
pub fn env_filter(config: &LoggingConfig) -> AttesterResult<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| AttesterError::Telemetry(e.to_string()))
}

/// Install the global `tracing` subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> AttesterResult<()> {
    let filter = env_filter(config)?;

    let result = if config.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_current_span(true),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init()
    };

    result.map_err(|e| AttesterError::Telemetry(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_rejected() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LoggingConfig {
            log_level: "qc_18_attester=loud".to_string(),
            json_logs: false,
        };
        assert!(matches!(
            env_filter(&config),
            Err(AttesterError::Telemetry(_))
        ));
    }

    #[test]
    fn test_second_init_fails() {
        let config = LoggingConfig::default();
        // Another test may already have installed a subscriber.
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }
}
