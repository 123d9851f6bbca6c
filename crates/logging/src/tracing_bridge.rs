//! Subscriber installation for the command-line front end.

use std::fmt;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use super::config::VerbosityConfig;

/// Environment variable whose value replaces the verbosity-derived filter.
pub const ENV_FILTER_VAR: &str = "RUST_LOG";

/// Failure to install the global subscriber.
#[derive(Debug)]
pub enum InitError {
    /// The filter directives could not be parsed.
    Filter(String),
    /// A global subscriber is already installed.
    AlreadyInstalled,
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filter(reason) => write!(f, "invalid log filter: {reason}"),
            Self::AlreadyInstalled => f.write_str("a tracing subscriber is already installed"),
        }
    }
}

impl std::error::Error for InitError {}

/// Builds the filter for `config`, letting a non-empty `RUST_LOG` win.
pub fn build_filter(config: &VerbosityConfig) -> Result<EnvFilter, InitError> {
    let directives = match std::env::var(ENV_FILTER_VAR) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => config.filter_directives(),
    };
    EnvFilter::try_new(&directives).map_err(|e| InitError::Filter(e.to_string()))
}

/// Installs a stderr subscriber filtered by `config`.
///
/// Returns an error instead of panicking when the filter is invalid or a
/// subscriber is already installed.
///
/// # Example
///
/// ```rust,ignore
/// use logging::{VerbosityConfig, try_init_tracing};
///
/// try_init_tracing(&VerbosityConfig::from_verbose_level(2))?;
/// tracing::debug!(target: "lzchunk::chunk", "chunk written");
/// ```
pub fn try_init_tracing(config: &VerbosityConfig) -> Result<(), InitError> {
    let filter = build_filter(config)?;
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.shows_debug())
        .without_time();

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|_| InitError::AlreadyInstalled)
}

/// Installs a stderr subscriber filtered by `config`.
///
/// Falls back to the level-derived filter when `RUST_LOG` is malformed and
/// does nothing when a subscriber is already installed.
pub fn init_tracing(config: &VerbosityConfig) {
    if let Err(InitError::Filter(_)) = try_init_tracing(config) {
        let fallback = EnvFilter::try_new(config.filter_directives())
            .unwrap_or_else(|_| EnvFilter::new("warn"));
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .without_time();
        let _ = tracing_subscriber::registry()
            .with(fallback)
            .with(layer)
            .try_init();
    }
}
