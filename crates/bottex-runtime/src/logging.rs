//! Logging setup.
//!
//! One global `tracing-subscriber` registry with an [`EnvFilter`] and a single
//! `fmt` layer. The layer is assembled from three independent choices:
//!
//! ```text
//!  filter                 format                  sink
//! ┌──────────────────┐   ┌────────────────────┐   ┌─────────────────────────┐
//! │ level | RUST_LOG │ + │ compact | full     │ + │ stdout | stderr         │
//! │ + module filters │   │ pretty  | json*    │   │ file (never/daily/hour) │
//! └──────────────────┘   └────────────────────┘   └─────────────────────────┘
//!                         * with the `json-log` feature
//! ```
//!
//! ```rust,ignore
//! LoggingBuilder::new()
//!     .level(Level::DEBUG)
//!     .directive("bottex_framework=trace")
//!     .span_events(SpanEventConfig::LIFECYCLE)
//!     .init();
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{LogFormat, LogOutput, LogRotation, LoggingConfig, SpanEventConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

impl SpanEventConfig {
    /// No span events.
    pub const NONE: Self = Self {
        new: false,
        enter: false,
        exit: false,
        close: false,
    };

    /// Creation and close: each `dispatch` span shows up once on the way in
    /// and once on the way out, with timings.
    pub const LIFECYCLE: Self = Self {
        new: true,
        enter: false,
        exit: false,
        close: true,
    };

    /// Every span event.
    pub const FULL: Self = Self {
        new: true,
        enter: true,
        exit: true,
        close: true,
    };

    fn fmt_span(self) -> FmtSpan {
        [
            (self.new, FmtSpan::NEW),
            (self.enter, FmtSpan::ENTER),
            (self.exit, FmtSpan::EXIT),
            (self.close, FmtSpan::CLOSE),
        ]
        .into_iter()
        .filter(|(on, _)| *on)
        .fold(FmtSpan::NONE, |acc, (_, flag)| acc | flag)
    }
}

/// Installs the global subscriber described by `config`.
///
/// Does nothing if a subscriber is already installed.
pub fn init_from_config(config: &LoggingConfig) {
    LoggingBuilder::from_config(config).init();
}

/// Where formatted events go.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Sink {
    Stdout,
    Stderr,
    File { path: PathBuf, rotation: LogRotation },
}

impl Sink {
    fn writer(&self) -> BoxMakeWriter {
        match self {
            Sink::Stdout => BoxMakeWriter::new(std::io::stdout),
            Sink::Stderr => BoxMakeWriter::new(std::io::stderr),
            Sink::File { path, rotation } => BoxMakeWriter::new(file_appender(path, *rotation)),
        }
    }
}

fn file_appender(path: &Path, rotation: LogRotation) -> RollingFileAppender {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let file = path.file_name().unwrap_or_else(|| OsStr::new("bottex.log"));
    match rotation {
        LogRotation::Never => rolling::never(dir, file),
        LogRotation::Daily => rolling::daily(dir, file),
        LogRotation::Hourly => rolling::hourly(dir, file),
    }
}

/// Builder for the global subscriber.
#[derive(Debug)]
pub struct LoggingBuilder {
    level: Level,
    directives: Vec<String>,
    format: LogFormat,
    span_events: SpanEventConfig,
    target: bool,
    thread_ids: bool,
    location: bool,
    sink: Sink,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            directives: Vec::new(),
            format: LogFormat::default(),
            span_events: SpanEventConfig::NONE,
            target: true,
            thread_ids: false,
            location: false,
            sink: Sink::Stdout,
        }
    }
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translates the `[logging]` section.
    ///
    /// `output = "file"` without a `file_path` falls back to stdout.
    pub fn from_config(config: &LoggingConfig) -> Self {
        let sink = match (config.output, &config.file_path) {
            (LogOutput::Stdout, _) => Sink::Stdout,
            (LogOutput::Stderr, _) => Sink::Stderr,
            (LogOutput::File, Some(path)) => Sink::File {
                path: path.clone(),
                rotation: config.rotation,
            },
            (LogOutput::File, None) => {
                eprintln!("Warning: log output is 'file' but no file_path is set, using stdout");
                Sink::Stdout
            }
        };

        let mut directives: Vec<String> = config
            .filters
            .iter()
            .map(|(module, level)| format!("{module}={}", level.as_str()))
            .collect();
        directives.sort();

        Self {
            level: config.level.to_tracing_level(),
            directives,
            format: config.format,
            span_events: config.span_events,
            target: true,
            thread_ids: config.thread_ids,
            location: config.file_location,
            sink,
        }
    }

    /// Base level, used when `RUST_LOG` is unset.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Adds a filter directive such as `"bottex_framework=trace"`.
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn span_events(mut self, events: SpanEventConfig) -> Self {
        self.span_events = events;
        self
    }

    pub fn target(mut self, enabled: bool) -> Self {
        self.target = enabled;
        self
    }

    pub fn thread_ids(mut self, enabled: bool) -> Self {
        self.thread_ids = enabled;
        self
    }

    /// Includes the file and line of each event.
    pub fn location(mut self, enabled: bool) -> Self {
        self.location = enabled;
        self
    }

    pub fn stderr(mut self) -> Self {
        self.sink = Sink::Stderr;
        self
    }

    /// Writes to `path`, rotated as requested.
    pub fn file(mut self, path: impl Into<PathBuf>, rotation: LogRotation) -> Self {
        self.sink = Sink::File {
            path: path.into(),
            rotation,
        };
        self
    }

    fn filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.as_str().to_lowercase()));
        for directive in &self.directives {
            match directive.parse() {
                Ok(d) => filter = filter.add_directive(d),
                Err(e) => eprintln!("Ignoring invalid log directive '{directive}': {e}"),
            }
        }
        filter
    }

    fn layer(&self) -> BoxedLayer {
        let base = fmt::layer()
            .with_writer(self.sink.writer())
            .with_span_events(self.span_events.fmt_span())
            .with_target(self.target)
            .with_thread_ids(self.thread_ids)
            .with_file(self.location)
            .with_line_number(self.location);

        match self.format {
            LogFormat::Compact => base.compact().boxed(),
            LogFormat::Full => base.boxed(),
            LogFormat::Pretty => base.pretty().boxed(),
            #[cfg(feature = "json-log")]
            LogFormat::Json => base.json().boxed(),
            #[cfg(not(feature = "json-log"))]
            LogFormat::Json => {
                eprintln!("Warning: JSON logs need the 'json-log' feature, using the full format");
                base.boxed()
            }
        }
    }

    /// Installs the subscriber, ignoring an already installed one.
    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Installs the subscriber.
    pub fn try_init(self) -> Result<(), TryInitError> {
        tracing_subscriber::registry()
            .with(self.layer())
            .with(self.filter())
            .try_init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use std::collections::HashMap;

    #[test]
    fn test_from_config() {
        let config = LoggingConfig {
            level: LogLevel::Debug,
            format: LogFormat::Pretty,
            filters: HashMap::from([
                ("bottex_framework".to_string(), LogLevel::Trace),
                ("bottex_adapter_vk".to_string(), LogLevel::Warn),
            ]),
            file_location: true,
            span_events: SpanEventConfig {
                new: true,
                close: true,
                ..Default::default()
            },
            ..Default::default()
        };

        let builder = LoggingBuilder::from_config(&config);

        assert_eq!(builder.level, Level::DEBUG);
        assert_eq!(builder.format, LogFormat::Pretty);
        assert_eq!(
            builder.directives,
            vec!["bottex_adapter_vk=warn", "bottex_framework=trace"]
        );
        assert!(builder.location);
        assert_eq!(builder.span_events, SpanEventConfig::LIFECYCLE);
        assert_eq!(builder.sink, Sink::Stdout);
    }

    #[test]
    fn test_file_output_without_path_uses_stdout() {
        let config = LoggingConfig {
            output: LogOutput::File,
            ..Default::default()
        };
        assert_eq!(LoggingBuilder::from_config(&config).sink, Sink::Stdout);
    }

    #[test]
    fn test_span_flags() {
        assert_eq!(SpanEventConfig::NONE.fmt_span(), FmtSpan::NONE);
        assert_eq!(SpanEventConfig::FULL.fmt_span(), FmtSpan::FULL);
        assert_eq!(
            SpanEventConfig::LIFECYCLE.fmt_span(),
            FmtSpan::NEW | FmtSpan::CLOSE
        );
    }
}
