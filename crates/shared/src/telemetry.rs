//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::error::AppError;

/// Installs the global tracing subscriber.
///
/// Called once at startup by the service embedding the engine, with the
/// `logging` section of [`AppConfig`](crate::AppConfig).
///
/// `RUST_LOG` wins over the configured filter.
///
/// # Errors
///
/// Returns `AppError::Internal` if a global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), AppError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    result.map_err(|e| AppError::Internal(format!("tracing already initialised: {e}")))?;
    tracing::debug!(filter = %config.filter, json = config.json, "Tracing initialised");
    Ok(())
}
