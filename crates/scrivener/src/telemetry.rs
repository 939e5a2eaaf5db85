//! Tracing subscriber setup.

use crate::LoggingSettings;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level; `verbose` raises the
/// configured level to `debug`. Logs go to stderr so stdout stays free for
/// streamed events.
///
/// # Errors
///
/// Fails if the filter directive is invalid or a subscriber is already set.
pub fn init_logging(
    settings: &LoggingSettings,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let directive = if verbose {
        "debug,hyper=info,reqwest=info".to_string()
    } else {
        settings.level.clone()
    };

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&directive)?,
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    if settings.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()?;
    }

    tracing::debug!(json = settings.json, "Logging initialized");
    Ok(())
}
