//! Logging initialization and configuration.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

use crate::config::LoggingConfig;

/// Crates whose events follow the configured level.
const APP_TARGETS: [&str; 4] = ["roster", "roster_api", "domain", "persistence"];

/// Filter used when `RUST_LOG` is not set.
///
/// Application crates log at the configured level; noisy dependencies are
/// capped at `warn`.
pub fn default_filter(level: &str) -> String {
    let mut directives: Vec<String> = APP_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect();
    directives.push("tower_http=info".to_string());
    directives.push("sqlx=warn".to_string());
    directives.push("hyper=warn".to_string());
    directives.push("warn".to_string());
    directives.join(",")
}

/// Initializes the global subscriber. `RUST_LOG` overrides the configured
/// level. Format is `json` or anything else for human-readable output.
pub fn init_logging(config: &LoggingConfig) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&config.level)));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config.format == "json" {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_span_events(FmtSpan::CLOSE)
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_target(true),
            )
            .try_init()
    } else {
        subscriber
            .with(
                fmt::layer()
                    .pretty()
                    .with_span_events(FmtSpan::CLOSE)
                    .with_target(true),
            )
            .try_init()
    }
}
