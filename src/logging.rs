//! Tracing subscriber setup.
//!
//! `RUST_LOG` selects levels (default `info`), `LOG_FORMAT` selects the
//! output: `json` for log collectors, `compact`, or human readable text.

use anyhow::{Context, Result};
use std::env;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LEVEL: &str = "info";

/// Log line layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
    Pretty,
}

impl LogFormat {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|r| r.trim().to_ascii_lowercase()).as_deref() {
            Some("json") => LogFormat::Json,
            Some("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self {
            level: env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LEVEL.to_string()),
            format: LogFormat::parse(env::var("LOG_FORMAT").ok().as_deref()),
        }
    }

    fn filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::try_new(&self.level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));
        for directive in ["hyper=warn", "reqwest=warn", "sqlx=warn"] {
            if let Ok(directive) = directive.parse() {
                filter = filter.add_directive(directive);
            }
        }
        filter
    }

    /// Install the global subscriber. Fails if one is already installed.
    pub fn init(&self) -> Result<()> {
        let registry = tracing_subscriber::registry().with(self.filter());

        match self.format {
            LogFormat::Json => registry.with(fmt::layer().json().with_target(true)).try_init(),
            LogFormat::Compact => registry.with(fmt::layer().compact().with_target(false)).try_init(),
            LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init(),
        }
        .context("Failed to install tracing subscriber")
    }
}

/// Initialise logging from the environment
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!(LogFormat::parse(Some("json")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some(" JSON ")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("compact")), LogFormat::Compact);
        assert_eq!(LogFormat::parse(Some("whatever")), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(None), LogFormat::Pretty);
    }

    #[test]
    fn test_invalid_level_falls_back() {
        let config = LoggingConfig {
            level: "not a [valid directive".to_string(),
            format: LogFormat::Pretty,
        };

        // Must not panic
        let _ = config.filter();
    }
}
