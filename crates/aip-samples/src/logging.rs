//! Tracing subscriber setup for sample binaries and test harnesses.

use crate::config::{ClientConfig, LogFormat};
use crate::error::{SampleError, SampleResult};
use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "info";

/// Builds the log filter: `RUST_LOG` wins, then `level`, then `info`.
///
/// An unparsable `level` falls back to `info`.
#[must_use]
pub fn build_filter(level: Option<&str>) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    filter_for_level(level)
}

fn filter_for_level(level: Option<&str>) -> EnvFilter {
    let level = level.map(str::trim).filter(|l| !l.is_empty()).unwrap_or(DEFAULT_LEVEL);
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

/// Installs the global subscriber described by `config`.
///
/// Fails if a global subscriber is already set.
pub fn init_logging(config: &ClientConfig) -> SampleResult<()> {
    let filter = build_filter(config.log_level.as_deref());
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let result = match config.log_format.unwrap_or_default() {
        LogFormat::Human => builder.without_time().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| SampleError::Logging(e.to_string()))
}
