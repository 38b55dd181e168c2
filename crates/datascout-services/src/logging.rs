//! Logging and tracing setup
//!
//! Pretty console output for development and a daily-rotated JSON file for
//! bug reports. `RUST_LOG` overrides the configured filter.

use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Targets that get their own level in the profile filters
const DATASCOUT_CRATES: [&str; 4] = [
    "datascout_core",
    "datascout_schema",
    "datascout_confirm",
    "datascout_services",
];

/// Filter directive: `base` for dependencies, `level` for the DataScout crates
fn crate_filter(base: &str, level: &str) -> String {
    DATASCOUT_CRATES
        .iter()
        .fold(base.to_string(), |mut filter, target| {
            let _ = write!(filter, ",{}={}", target, level);
            filter
        })
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Directory where log files should be written
    pub log_dir: PathBuf,

    /// Whether to write JSON logs to files
    pub enable_json_logs: bool,

    /// Whether to enable pretty console output
    pub enable_console_logs: bool,

    /// Whether to include file/line information in logs
    pub include_location: bool,

    /// Whether to log span open/close events
    pub enable_spans: bool,

    /// Default log level filter
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: log_directory(),
            enable_json_logs: true,
            enable_console_logs: true,
            include_location: cfg!(debug_assertions),
            enable_spans: cfg!(debug_assertions),
            default_filter: crate_filter("info", "debug"),
        }
    }
}

impl LoggingConfig {
    /// Minimal console output, JSON logs for bug reports
    pub fn production() -> Self {
        Self {
            log_dir: log_directory(),
            enable_json_logs: true,
            enable_console_logs: false,
            include_location: false,
            enable_spans: false,
            default_filter: crate_filter("warn", "info"),
        }
    }

    pub fn development() -> Self {
        Self::default()
    }

    /// Console only, no files
    pub fn testing() -> Self {
        Self {
            log_dir: std::env::temp_dir().join("datascout-tests"),
            enable_json_logs: false,
            enable_console_logs: true,
            include_location: true,
            enable_spans: true,
            default_filter: "debug".to_string(),
        }
    }

    pub fn with_log_dir(mut self, log_dir: impl AsRef<Path>) -> Self {
        self.log_dir = log_dir.as_ref().to_path_buf();
        self
    }
}

/// Keeps the background log writer alive; drop it at shutdown to flush
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file_writer: Option<WorkerGuard>,
}

/// Install the global subscriber
///
/// Fails if a global subscriber is already installed.
pub fn init(config: LoggingConfig) -> anyhow::Result<LoggingGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    // NEW fires once per span; ENTER would fire on every re-poll of an awaited future.
    let span_events = if config.enable_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let mut layers = Vec::new();
    let mut file_writer = None;

    if config.enable_console_logs {
        let console_layer = fmt::layer()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_span_events(span_events.clone())
            .with_ansi(true)
            .pretty()
            .with_filter(env_filter.clone())
            .boxed();

        layers.push(console_layer);
    }

    if config.enable_json_logs {
        std::fs::create_dir_all(&config.log_dir)?;
        let file_appender = tracing_appender::rolling::daily(&config.log_dir, "datascout.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        file_writer = Some(guard);

        let json_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_span_events(span_events)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(non_blocking)
            .with_filter(env_filter)
            .boxed();

        layers.push(json_layer);
    }

    tracing_subscriber::registry().with(layers).try_init()?;

    tracing::info!(
        log_dir = %config.log_dir.display(),
        json_enabled = config.enable_json_logs,
        console_enabled = config.enable_console_logs,
        "Logging system initialized"
    );

    Ok(LoggingGuard {
        _file_writer: file_writer,
    })
}

/// Initialize logging with the profile matching the build
pub fn init_default() -> anyhow::Result<LoggingGuard> {
    let config = if cfg!(debug_assertions) {
        LoggingConfig::development()
    } else {
        LoggingConfig::production()
    };

    init(config)
}

pub fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("datascout")
        .join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_logging_config_defaults() {
        let config = LoggingConfig::default();
        assert!(config.enable_console_logs);
        assert!(config.enable_json_logs);
        assert!(config.log_dir.ends_with("datascout/logs"));
    }

    #[test]
    fn test_production_config() {
        let config = LoggingConfig::production();
        assert!(!config.enable_console_logs);
        assert!(config.enable_json_logs);
        assert!(!config.include_location);
        assert!(!config.enable_spans);
    }

    #[test]
    fn test_development_config() {
        let config = LoggingConfig::development();
        let default = LoggingConfig::default();
        assert!(config.enable_console_logs);
        assert!(config.enable_json_logs);
        assert_eq!(config.default_filter, default.default_filter);
    }

    #[test]
    fn test_testing_config_writes_no_files() {
        let config = LoggingConfig::testing();
        assert!(config.enable_console_logs);
        assert!(!config.enable_json_logs);
        assert_eq!(config.default_filter, "debug");
    }

    #[test]
    fn test_profile_filters_name_every_crate() {
        assert_eq!(
            LoggingConfig::production().default_filter,
            "warn,datascout_core=info,datascout_schema=info,\
             datascout_confirm=info,datascout_services=info"
        );
        for config in [
            LoggingConfig::default(),
            LoggingConfig::production(),
            LoggingConfig::testing(),
        ] {
            assert!(EnvFilter::try_new(&config.default_filter).is_ok());
        }
    }

    // The only test that installs the global subscriber.
    #[test]
    fn test_second_init_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        let config = LoggingConfig {
            enable_json_logs: true,
            enable_console_logs: false,
            ..LoggingConfig::testing().with_log_dir(&log_dir)
        };

        let guard = init(config).unwrap();
        assert!(log_dir.is_dir());

        assert!(init(LoggingConfig::testing()).is_err());
        drop(guard);
    }
}
