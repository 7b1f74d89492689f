//! Logging configuration and setup.

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::{TelemetryError, TelemetryResult};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log files are named `kvmux.<date>.log` (or `kvmux.log` without rotation).
const FILE_PREFIX: &str = "kvmux";

/// How often the log file in a [`LogTarget::File`] directory is rolled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileRotation {
    /// One file per day.
    #[default]
    Daily,
    /// One file per hour.
    Hourly,
    /// A single file that grows forever.
    Never,
}

impl From<FileRotation> for Rotation {
    fn from(rotation: FileRotation) -> Self {
        match rotation {
            FileRotation::Daily => Rotation::DAILY,
            FileRotation::Hourly => Rotation::HOURLY,
            FileRotation::Never => Rotation::NEVER,
        }
    }
}

impl std::str::FromStr for FileRotation {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "hourly" => Ok(Self::Hourly),
            "never" => Ok(Self::Never),
            other => Err(TelemetryError::ConfigError(format!(
                "unknown log rotation: {other}"
            ))),
        }
    }
}

/// Log format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line format.
    Pretty,
    /// Compact single-line format (default).
    #[default]
    Compact,
    /// JSON format for structured logging.
    Json,
    /// Full single-line format with all fields.
    Full,
}

impl std::str::FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            "full" => Ok(Self::Full),
            other => Err(TelemetryError::ConfigError(format!(
                "unknown log format: {other}"
            ))),
        }
    }
}

/// Where log lines go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LogTarget {
    /// Standard output.
    Stdout,
    /// Standard error.
    #[default]
    Stderr,
    /// Rolling files in this directory, created if missing.
    File(PathBuf),
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
    /// Log format.
    pub format: LogFormat,
    /// Log target.
    pub target: LogTarget,
    /// Rotation of the log file; only used with [`LogTarget::File`].
    pub rotation: FileRotation,
    /// Whether to include timestamps.
    pub timestamps: bool,
    /// Whether to use ANSI colors. Never applied to files or JSON.
    pub ansi: bool,
    /// Directive overrides (e.g., `kvmux_storage=trace`).
    pub directives: Vec<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_owned(),
            format: LogFormat::default(),
            target: LogTarget::default(),
            rotation: FileRotation::default(),
            timestamps: true,
            ansi: true,
            directives: Vec::new(),
        }
    }
}

impl LogConfig {
    /// Create a new log config with the specified level.
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }

    /// Set the log format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Log to rolling files in `directory`.
    #[must_use]
    pub fn with_file_target(
        mut self,
        directory: impl Into<PathBuf>,
        rotation: FileRotation,
    ) -> Self {
        self.target = LogTarget::File(directory.into());
        self.rotation = rotation;
        self
    }

    /// Add a directive override.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    fn build_filter(&self) -> TelemetryResult<EnvFilter> {
        let mut filter = EnvFilter::try_new(&self.level)
            .map_err(|e| TelemetryError::ConfigError(e.to_string()))?;

        for directive in &self.directives {
            filter = filter.add_directive(directive.parse().map_err(
                |e: tracing_subscriber::filter::ParseError| {
                    TelemetryError::ConfigError(e.to_string())
                },
            )?);
        }

        Ok(filter)
    }

    fn writer(&self) -> TelemetryResult<BoxMakeWriter> {
        match &self.target {
            LogTarget::Stdout => Ok(BoxMakeWriter::new(std::io::stdout)),
            LogTarget::Stderr => Ok(BoxMakeWriter::new(std::io::stderr)),
            LogTarget::File(dir) => {
                std::fs::create_dir_all(dir)?;
                let appender = RollingFileAppender::builder()
                    .rotation(self.rotation.into())
                    .filename_prefix(FILE_PREFIX)
                    .filename_suffix("log")
                    .build(dir)
                    .map_err(|e| TelemetryError::ConfigError(e.to_string()))?;
                Ok(BoxMakeWriter::new(appender))
            },
        }
    }

    fn ansi_enabled(&self) -> bool {
        self.ansi && self.format != LogFormat::Json && !matches!(self.target, LogTarget::File(_))
    }

    fn layer(&self) -> TelemetryResult<BoxedLayer> {
        let layer = fmt::layer()
            .with_writer(self.writer()?)
            .with_ansi(self.ansi_enabled());

        Ok(match (self.format, self.timestamps) {
            (LogFormat::Json, true) => layer.json().boxed(),
            (LogFormat::Json, false) => layer.json().without_time().boxed(),
            (LogFormat::Pretty, true) => layer.pretty().boxed(),
            (LogFormat::Pretty, false) => layer.pretty().without_time().boxed(),
            (LogFormat::Compact, true) => layer.compact().boxed(),
            (LogFormat::Compact, false) => layer.compact().without_time().boxed(),
            (LogFormat::Full, true) => layer.boxed(),
            (LogFormat::Full, false) => layer.without_time().boxed(),
        })
    }
}

/// Build the subscriber described by `config` without installing it.
///
/// # Errors
///
/// Returns an error if a filter directive is invalid or the log directory
/// cannot be created.
pub fn subscriber(
    config: &LogConfig,
) -> TelemetryResult<impl tracing::Subscriber + Send + Sync + 'static> {
    let filter = config.build_filter()?;
    let layer = config.layer()?;
    Ok(tracing_subscriber::registry().with(layer).with(filter))
}

/// Install the subscriber described by `config` as the global default.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the log directory
/// cannot be created, or a global subscriber is already installed.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    subscriber(config)?
        .try_init()
        .map_err(|e| TelemetryError::InitError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.target, LogTarget::Stderr);
        assert!(config.timestamps);
        assert!(config.ansi_enabled());
    }

    #[test]
    fn test_no_ansi_in_files_or_json() {
        let json = LogConfig::default().with_format(LogFormat::Json);
        assert!(!json.ansi_enabled());

        let file = LogConfig::default().with_file_target("logs", FileRotation::Hourly);
        assert_eq!(file.target, LogTarget::File(PathBuf::from("logs")));
        assert_eq!(file.rotation, FileRotation::Hourly);
        assert!(!file.ansi_enabled());
    }

    #[test]
    fn test_parse_format_and_rotation() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("full".parse::<LogFormat>().unwrap(), LogFormat::Full);
        assert!("xml".parse::<LogFormat>().is_err());

        assert_eq!("never".parse::<FileRotation>().unwrap(), FileRotation::Never);
        assert!("weekly".parse::<FileRotation>().is_err());
    }

    #[test]
    fn test_build_filter() {
        let config = LogConfig::new("debug").with_directive("kvmux=trace");
        assert!(config.build_filter().is_ok());

        // EnvFilter accepts unknown targets, so use invalid syntax
        let config = LogConfig::new("debug").with_directive("[invalid=syntax");
        assert!(config.build_filter().is_err());
    }

    #[test]
    fn test_file_target_writes_events() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("nested").join("logs");
        let config = LogConfig::new("info").with_file_target(&logs, FileRotation::Never);

        let subscriber = subscriber(&config).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(table = "fruit", "table opened");
            tracing::debug!("filtered out");
        });

        let content = std::fs::read_to_string(logs.join("kvmux.log")).unwrap();
        assert!(content.contains("table opened"));
        assert!(content.contains("fruit"));
        assert!(!content.contains("filtered out"));
        assert!(!content.contains('\u{1b}'), "no ANSI escapes in files");
    }
}
