//! Tracing initialisation for the command-line tool.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

/// Level used when neither the command line, `RUST_LOG` nor the config file sets one
pub const DEFAULT_LEVEL: &str = "warn";

/// Pick the filter directives: explicit override, then `RUST_LOG`, then config
pub fn resolve_directives(cli_level: Option<&str>, config: &LogConfig) -> String {
    if let Some(level) = cli_level.filter(|level| !level.trim().is_empty()) {
        return level.to_string();
    }
    if let Some(env) = std::env::var("RUST_LOG").ok().filter(|v| !v.trim().is_empty()) {
        return env;
    }
    config
        .level
        .clone()
        .filter(|level| !level.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string())
}

/// Install the global subscriber. Logs go to stderr so stdout stays parseable.
///
/// Calling this twice is harmless; the second call is ignored.
pub fn init_tracing(cli_level: Option<&str>, config: &LogConfig) {
    let directives = resolve_directives(cli_level, config);
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

    let result = if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(err) = result {
        tracing::debug!(%err, "tracing already initialised");
    }
}
