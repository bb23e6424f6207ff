//! Observability middleware.
//!
//! Installs the global tracing subscriber. `RUST_LOG` controls the filter
//! (default: info).

use crate::config::LogFormat;
use tracing_subscriber::EnvFilter;

pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Initialize tracing once for the process.
///
/// Logs go to stderr, as JSON lines when `format` is [`LogFormat::Json`].
pub fn init_tracing(format: LogFormat) -> Result<(), InitError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);

    match format {
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
        LogFormat::Text => builder.try_init(),
    }
}
