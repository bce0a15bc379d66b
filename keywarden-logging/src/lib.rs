//! Structured logging setup for Keywarden binaries

use keywarden_config::LogFormat;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Initialize logging in the configured format.
///
/// `RUST_LOG` takes precedence over `default_level`. Safe to call more than
/// once; later calls leave the first subscriber in place.
pub fn init_logging(service_name: &str, default_level: &str, format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let installed = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_current_span(false)
                    .with_span_list(false),
            )
            .try_init()
            .is_ok(),
        LogFormat::Console => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::info!(
            service = service_name,
            format = ?format,
            "Logging initialized"
        );
    }
}

/// Initialize human-readable console logging (for local runs)
pub fn init_console_logging(service_name: &str, default_level: &str) {
    init_logging(service_name, default_level, LogFormat::Console);
}
