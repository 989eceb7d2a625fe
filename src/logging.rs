//! Log setup.
//!
//! Level precedence: `RUST_LOG`, then the config file's `log_level`, then the
//! `--log-level` flag. Both the classic names (`WARNING`, `CRITICAL`, ...) and
//! tracing's own names are accepted.

use tracing_subscriber::EnvFilter;

/// Map a level name to a tracing filter directive.
pub fn level_directive(name: &str) -> Option<&'static str> {
    match name.trim().to_ascii_uppercase().as_str() {
        "NOTSET" | "TRACE" => Some("trace"),
        "DEBUG" => Some("debug"),
        "INFO" => Some("info"),
        "WARNING" | "WARN" => Some("warn"),
        "ERROR" | "CRITICAL" => Some("error"),
        "OFF" => Some("off"),
        _ => None,
    }
}

/// Install the global subscriber.
///
/// Returns the directive in effect when `RUST_LOG` is unset.
pub fn init(cli_level: &str, config_level: Option<&str>) -> &'static str {
    let config_directive = config_level.and_then(level_directive);
    let directive = config_directive
        .or_else(|| level_directive(cli_level))
        .unwrap_or("warn");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Some(level) = config_level {
        match config_directive {
            Some(directive) => {
                tracing::info!("Logging level set to {} from config file.", directive)
            }
            None => tracing::warn!("Ignoring unknown log_level '{}' in config file", level),
        }
    }

    directive
}
