//! Logging setup shared by the CLI and the booking daemon.
//!
//! ```ignore
//! use zoomzone_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::daemon())?;
//! ```

use std::str::FromStr;

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("unknown log format '{0}', expected pretty, compact or json")]
    UnknownFormat(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    #[default]
    Pretty,
    Compact,
    /// One JSON object per event; what the daemon writes by default.
    Json,
}

impl FromStr for TracingOutputFormat {
    type Err = TracingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(TracingError::UnknownFormat(other.to_string())),
        }
    }
}

/// How the global subscriber is built. `RUST_LOG` always wins over `level`.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub level: Level,
    pub format: TracingOutputFormat,
    /// Print `file:line` of each event.
    pub with_location: bool,
    pub with_timestamp: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingOutputFormat::Pretty,
            with_location: false,
            with_timestamp: true,
        }
    }
}

impl TracingConfig {
    /// `--debug` on a one-shot command: terse lines with source locations.
    #[must_use]
    pub fn cli_debug() -> Self {
        Self {
            level: Level::DEBUG,
            format: TracingOutputFormat::Compact,
            with_location: true,
            with_timestamp: false,
        }
    }

    #[must_use]
    pub fn daemon() -> Self {
        Self {
            format: TracingOutputFormat::Json,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: TracingOutputFormat) -> Self {
        self.format = format;
        self
    }
}

/// Installs the global subscriber. Call once per process.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config.level)));

    let base = fmt::layer()
        .with_file(config.with_location)
        .with_line_number(config.with_location);
    let layer: Box<dyn Layer<Registry> + Send + Sync> =
        match (config.format, config.with_timestamp) {
            (TracingOutputFormat::Pretty, true) => base.pretty().boxed(),
            (TracingOutputFormat::Pretty, false) => base.pretty().without_time().boxed(),
            (TracingOutputFormat::Compact, true) => base.compact().boxed(),
            (TracingOutputFormat::Compact, false) => base.compact().without_time().boxed(),
            (TracingOutputFormat::Json, true) => base.json().boxed(),
            (TracingOutputFormat::Json, false) => base.json().without_time().boxed(),
        };

    tracing::subscriber::set_global_default(Registry::default().with(layer).with(filter))?;
    Ok(())
}

/// Applies `level` to the workspace crates only; dependencies stay quiet.
fn default_directive(level: Level) -> String {
    ["zoomzone", "zoomzone_core", "zoomzone_providers", "zoomzone_server", "zoomzone_client"]
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    mod profiles {
        use super::*;

        #[test]
        fn daemon_logs_json_at_info() {
            let config = TracingConfig::daemon();
            assert_eq!(config.level, Level::INFO);
            assert_eq!(config.format, TracingOutputFormat::Json);
            assert!(config.with_timestamp);
        }

        #[test]
        fn cli_debug_shows_locations_without_time() {
            let config = TracingConfig::cli_debug();
            assert_eq!(config.level, Level::DEBUG);
            assert!(config.with_location);
            assert!(!config.with_timestamp);
        }

        #[test]
        fn quiet_cli_profile() {
            let config = TracingConfig::default()
                .with_level(Level::WARN)
                .with_format(TracingOutputFormat::Compact);
            assert_eq!(config.level, Level::WARN);
            assert_eq!(config.format, TracingOutputFormat::Compact);
        }
    }

    #[test]
    fn format_names_are_case_insensitive() {
        assert_eq!("JSON".parse::<TracingOutputFormat>().unwrap(), TracingOutputFormat::Json);
        assert_eq!(
            " compact ".parse::<TracingOutputFormat>().unwrap(),
            TracingOutputFormat::Compact
        );
        assert!(matches!(
            "xml".parse::<TracingOutputFormat>(),
            Err(TracingError::UnknownFormat(_))
        ));
    }

    #[test]
    fn directive_covers_every_crate_and_parses() {
        let directive = default_directive(Level::DEBUG);
        assert!(directive.contains("zoomzone_server=DEBUG"));
        assert!(directive.contains("zoomzone_client=DEBUG"));
        assert!(EnvFilter::try_new(&directive).is_ok());
    }
}
