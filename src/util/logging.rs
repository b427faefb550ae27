use crate::config::LoggingConfig;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Initializes tracing/logging based on environment variables and the
/// logging section of the configuration.
///
/// Warnings and errors are additionally appended to `error_log_file` when one
/// is configured.
pub fn init_tracing(config: &LoggingConfig) -> std::io::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console = if config.json {
        fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(false)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .boxed()
    };

    let error_file = match &config.error_log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(file))
                    .with_filter(LevelFilter::WARN),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console.with_filter(env_filter))
        .with(error_file)
        .init();

    Ok(())
}
