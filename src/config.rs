use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, de};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// The `logging` section of the configuration document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Schema version, only 1 is understood
    #[serde(default = "default_version")]
    pub version: u32,
    /// Named formatters
    #[serde(default)]
    pub formatters: BTreeMap<String, FormatterConfig>,
    /// Named handlers
    #[serde(default)]
    pub handlers: BTreeMap<String, HandlerConfig>,
    /// Root logger
    #[serde(default)]
    pub root: RootConfig,
    /// Per-target loggers
    #[serde(default)]
    pub loggers: BTreeMap<String, LoggerConfig>,
}

impl LoggingConfig {
    /// Create an empty LoggingConfig
    pub fn new() -> Self {
        Self {
            version: default_version(),
            formatters: BTreeMap::new(),
            handlers: BTreeMap::new(),
            root: RootConfig::default(),
            loggers: BTreeMap::new(),
        }
    }

    /// Add a named formatter
    pub fn with_formatter(mut self, name: impl Into<String>, formatter: FormatterConfig) -> Self {
        self.formatters.insert(name.into(), formatter);
        self
    }

    /// Add a named handler
    pub fn with_handler(mut self, name: impl Into<String>, handler: HandlerConfig) -> Self {
        self.handlers.insert(name.into(), handler);
        self
    }

    /// Set the root logger
    pub fn with_root(mut self, root: RootConfig) -> Self {
        self.root = root;
        self
    }

    /// Add a logger for a target
    pub fn with_logger(mut self, target: impl Into<String>, logger: LoggerConfig) -> Self {
        self.loggers.insert(target.into(), logger);
        self
    }

    /// Check that every reference in the section resolves.
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(Error::Config(format!(
                "unsupported logging config version: {}",
                self.version
            )));
        }

        parse_level(&self.root.level)?;
        for (name, handler) in &self.handlers {
            parse_level(&handler.level)?;
            if let Some(formatter) = &handler.formatter
                && !self.formatters.contains_key(formatter)
            {
                return Err(Error::Config(format!(
                    "handler `{name}` references unknown formatter `{formatter}`"
                )));
            }
            if handler.class == HandlerClass::File && handler.filename.is_none() {
                return Err(Error::Config(format!(
                    "file handler `{name}` has no filename"
                )));
            }
            if handler.max_bytes > 0 && handler.when != RollingPeriod::Never {
                return Err(Error::Config(format!(
                    "handler `{name}` sets both max_bytes and when"
                )));
            }
        }

        let unknown = |owner: &str, handlers: &[String]| {
            handlers
                .iter()
                .find(|h| !self.handlers.contains_key(*h))
                .map(|h| {
                    Error::Config(format!(
                        "logger `{owner}` references unknown handler `{h}`"
                    ))
                })
        };
        if let Some(err) = unknown("root", &self.root.handlers) {
            return Err(err);
        }
        for (target, logger) in &self.loggers {
            if let Some(err) = unknown(target, &logger.handlers) {
                return Err(err);
            }
        }

        for logger in self.loggers.values() {
            if let Some(level) = &logger.level {
                parse_level(level)?;
            }
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_version() -> u32 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_handler_level() -> String {
    "notset".to_string()
}

fn default_true() -> bool {
    true
}

/// Parse a level name into a filter.
///
/// Accepts the usual names case-insensitively, plus `warning`, `critical`
/// and `notset`. Numeric levels use the 10/20/30/40/50 scale, where a
/// threshold between two named levels admits the higher one.
pub fn parse_level(level: &str) -> Result<LevelFilter> {
    let level = level.trim().to_ascii_lowercase();
    if let Ok(n) = level.parse::<u64>() {
        return Ok(match n {
            0 => LevelFilter::TRACE,
            1..=10 => LevelFilter::DEBUG,
            11..=20 => LevelFilter::INFO,
            21..=30 => LevelFilter::WARN,
            31..=50 => LevelFilter::ERROR,
            _ => LevelFilter::OFF,
        });
    }

    match level.as_str() {
        "trace" | "notset" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" | "warning" => Ok(LevelFilter::WARN),
        "error" | "critical" | "fatal" => Ok(LevelFilter::ERROR),
        "off" => Ok(LevelFilter::OFF),
        other => Err(Error::Config(format!("unknown log level: {other}"))),
    }
}

/// Output format of a formatter
///
/// Any `format` value other than `"json"`, such as a
/// `"%(asctime)s %(message)s"` pattern, selects text output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatKind {
    #[default]
    Text,
    Json,
}

/// How records are rendered
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    /// "json", or "text" / a pattern string for text
    #[serde(deserialize_with = "deserialize_format")]
    pub format: FormatKind,
    /// Show target/module in logs
    pub target: bool,
    /// Show thread IDs in logs
    pub thread_ids: bool,
    /// Show thread names in logs
    pub thread_names: bool,
    /// Show source line numbers in logs
    pub line_number: bool,
}

impl FormatterConfig {
    pub fn new(format: FormatKind) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }

    pub fn with_target(mut self, target: bool) -> Self {
        self.target = target;
        self
    }

    pub fn with_thread_ids(mut self, thread_ids: bool) -> Self {
        self.thread_ids = thread_ids;
        self
    }

    pub fn with_thread_names(mut self, thread_names: bool) -> Self {
        self.thread_names = thread_names;
        self
    }

    pub fn with_line_number(mut self, line_number: bool) -> Self {
        self.line_number = line_number;
        self
    }
}

/// Kind of destination a handler writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandlerClass {
    #[serde(
        rename = "console",
        alias = "stream",
        alias = "logging.StreamHandler"
    )]
    Console,
    #[serde(
        rename = "file",
        alias = "logging.FileHandler",
        alias = "logging.handlers.RotatingFileHandler",
        alias = "logging.handlers.TimedRotatingFileHandler"
    )]
    File,
}

/// Console stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stream {
    #[serde(alias = "ext://sys.stdout")]
    Stdout,
    #[default]
    #[serde(alias = "ext://sys.stderr")]
    Stderr,
}

/// How an existing log file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FileMode {
    #[default]
    #[serde(rename = "a")]
    Append,
    #[serde(rename = "w")]
    Truncate,
}

/// Time-based rotation period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollingPeriod {
    #[default]
    Never,
    #[serde(alias = "M", alias = "m")]
    Minutely,
    #[serde(alias = "H", alias = "h")]
    Hourly,
    #[serde(alias = "D", alias = "d", alias = "midnight", alias = "MIDNIGHT")]
    Daily,
}

/// A single handler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerConfig {
    pub class: HandlerClass,
    /// Minimum level this handler accepts
    #[serde(default = "default_handler_level", deserialize_with = "deserialize_level")]
    pub level: String,
    /// Name of the formatter to use; plain text when absent
    #[serde(default)]
    pub formatter: Option<String>,
    /// Console stream
    #[serde(default)]
    pub stream: Stream,
    /// Path of the log file (file handlers)
    #[serde(default)]
    pub filename: Option<PathBuf>,
    #[serde(default)]
    pub mode: FileMode,
    /// Rotate once the file would exceed this many bytes; 0 disables.
    /// Either a byte count or a string with a K/M/G unit ("10M").
    #[serde(default, alias = "maxBytes", deserialize_with = "deserialize_size")]
    pub max_bytes: u64,
    /// Rotated files to keep
    #[serde(default, alias = "backupCount")]
    pub backup_count: usize,
    /// Time-based rotation
    #[serde(default)]
    pub when: RollingPeriod,
}

impl HandlerConfig {
    /// A console handler on stderr.
    pub fn console() -> Self {
        Self {
            class: HandlerClass::Console,
            level: default_handler_level(),
            formatter: None,
            stream: Stream::default(),
            filename: None,
            mode: FileMode::default(),
            max_bytes: 0,
            backup_count: 0,
            when: RollingPeriod::default(),
        }
    }

    /// A file handler appending to `filename`.
    pub fn file(filename: impl Into<PathBuf>) -> Self {
        Self {
            class: HandlerClass::File,
            filename: Some(filename.into()),
            ..Self::console()
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_formatter(mut self, formatter: impl Into<String>) -> Self {
        self.formatter = Some(formatter.into());
        self
    }

    pub fn with_stream(mut self, stream: Stream) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_mode(mut self, mode: FileMode) -> Self {
        self.mode = mode;
        self
    }

    /// Rotate by size, keeping `backup_count` old files.
    pub fn with_size_rotation(mut self, max_bytes: u64, backup_count: usize) -> Self {
        self.max_bytes = max_bytes;
        self.backup_count = backup_count;
        self
    }

    pub fn with_rolling(mut self, when: RollingPeriod) -> Self {
        self.when = when;
        self
    }
}

/// The root logger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootConfig {
    #[serde(default = "default_log_level", deserialize_with = "deserialize_level")]
    pub level: String,
    #[serde(default)]
    pub handlers: Vec<String>,
}

impl RootConfig {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            handlers: Vec::new(),
        }
    }

    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handlers.push(handler.into());
        self
    }
}

impl Default for RootConfig {
    fn default() -> Self {
        Self::new(default_log_level())
    }
}

/// A logger bound to a target prefix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Level for this target; inherits the root level when absent
    #[serde(default, deserialize_with = "deserialize_optional_level")]
    pub level: Option<String>,
    #[serde(default)]
    pub handlers: Vec<String>,
    /// Also hand events to the root handlers
    #[serde(default = "default_true")]
    pub propagate: bool,
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self {
            level: None,
            handlers: Vec::new(),
            propagate: true,
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handlers.push(handler.into());
        self
    }

    pub fn with_propagate(mut self, propagate: bool) -> Self {
        self.propagate = propagate;
        self
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a size with an optional K/M/G unit (case-insensitive); bare numbers are bytes.
fn parse_size(s: &str) -> std::result::Result<u64, String> {
    let s = s.trim();
    let Some(last) = s.chars().last() else {
        return Err("empty size string".to_string());
    };

    let (num_str, multiplier) = if last.is_ascii_alphabetic() {
        let multiplier = match last.to_ascii_uppercase() {
            'K' => 1024,
            'M' => 1024 * 1024,
            'G' => 1024 * 1024 * 1024,
            unit => return Err(format!("invalid unit: {}, supported: K/M/G", unit)),
        };
        (&s[..s.len() - 1], multiplier)
    } else {
        (s, 1)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("invalid number: {}", num_str))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| "size too large".to_string())
}

fn deserialize_level<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LevelValue {
        Number(u64),
        Name(String),
    }

    Ok(match LevelValue::deserialize(deserializer)? {
        LevelValue::Number(n) => n.to_string(),
        LevelValue::Name(name) => name,
    })
}

fn deserialize_optional_level<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_level(deserializer).map(Some)
}

fn deserialize_format<'de, D>(deserializer: D) -> std::result::Result<FormatKind, D::Error>
where
    D: Deserializer<'de>,
{
    let format = String::deserialize(deserializer)?;
    Ok(if format.trim().eq_ignore_ascii_case("json") {
        FormatKind::Json
    } else {
        FormatKind::Text
    })
}

fn deserialize_size<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SizeValue {
        Number(u64),
        String(String),
    }

    match SizeValue::deserialize(deserializer)? {
        SizeValue::Number(n) => Ok(n),
        SizeValue::String(s) => parse_size(&s).map_err(de::Error::custom),
    }
}
