//! Turns a [`LoggingConfig`] into an installed `tracing` subscriber.
//!
//! Every handler becomes one `fmt` layer carrying its own filter: the logger
//! levels (or `RUST_LOG`), the handler level, and the set of targets whose
//! loggers the handler is attached to.

use crate::config::{
    FormatKind, FormatterConfig, HandlerClass, HandlerConfig, RollingPeriod, Stream,
};
use crate::writer::{FileSink, rolling_appender};
use crate::{Error, LoggingConfig, Result, parse_level};
use std::path::{Path, PathBuf};
use tracing::Dispatch;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::{EnvFilter, FilterExt, LevelFilter, Targets};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Filter, SubscriberExt};
use tracing_subscriber::{Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Keeps file handlers alive; dropping it flushes pending records.
#[must_use = "dropping the handle stops file logging"]
#[derive(Debug, Default)]
pub struct LoggingHandle {
    guards: Vec<WorkerGuard>,
    files: Vec<PathBuf>,
}

impl LoggingHandle {
    /// Files written by the configured file handlers.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

/// Build the subscriber described by `config` without installing it.
///
/// A non-empty `RUST_LOG` replaces the configured logger levels.
pub fn build(config: &LoggingConfig) -> Result<(Dispatch, LoggingHandle)> {
    let rust_log = std::env::var("RUST_LOG").ok();
    build_with_override(config, rust_log.as_deref())
}

/// Like [`build`], with the filter override given explicitly.
pub fn build_with_override(
    config: &LoggingConfig,
    rust_log: Option<&str>,
) -> Result<(Dispatch, LoggingHandle)> {
    config.validate()?;

    let log_spec = effective_log_spec(config, rust_log)?;

    let mut handle = LoggingHandle::default();
    let mut layers: Vec<BoxedLayer> = Vec::with_capacity(config.handlers.len());

    for (name, handler) in &config.handlers {
        let formatter = handler
            .formatter
            .as_ref()
            .and_then(|f| config.formatters.get(f))
            .cloned()
            .unwrap_or_default();

        let env_filter = EnvFilter::try_new(&log_spec)
            .map_err(|e| Error::Config(format!("invalid filter `{log_spec}`: {e}")))?;
        let filter = handler_targets(config, name, parse_level(&handler.level)?).and(env_filter);

        let layer = match handler.class {
            HandlerClass::Console => match handler.stream {
                Stream::Stdout => fmt_layer(std::io::stdout, &formatter, false, filter),
                Stream::Stderr => fmt_layer(std::io::stderr, &formatter, false, filter),
            },
            HandlerClass::File => {
                let (path, non_blocking, guard) = open_file_handler(name, handler)?;
                handle.guards.push(guard);
                handle.files.push(path);
                fmt_layer(non_blocking, &formatter, true, filter)
            }
        };
        layers.push(layer);
    }

    let subscriber = tracing_subscriber::registry().with(layers);
    Ok((Dispatch::new(subscriber), handle))
}

/// Build the subscriber and install it as the process-wide default.
///
/// # Errors
///
/// Returns an error if:
/// - A global subscriber is already installed
/// - A log file cannot be opened
/// - The configuration references unknown formatters or handlers
pub fn configure(config: LoggingConfig) -> Result<LoggingHandle> {
    // Checked before any file handler opens (and possibly truncates) a file
    // the installed subscriber is still writing to.
    if tracing::dispatcher::has_been_set() {
        return Err(Error::Init(
            "a global default subscriber has already been set".to_string(),
        ));
    }

    let (dispatch, handle) = build(&config)?;
    tracing::dispatcher::set_global_default(dispatch).map_err(|e| Error::Init(e.to_string()))?;

    tracing::info!(
        handlers = config.handlers.len(),
        files = ?handle.files(),
        "logging configured"
    );
    Ok(handle)
}

fn open_file_handler(
    name: &str,
    handler: &HandlerConfig,
) -> Result<(PathBuf, NonBlocking, WorkerGuard)> {
    let path = handler
        .filename
        .clone()
        .ok_or_else(|| Error::Config(format!("file handler `{name}` has no filename")))?;

    let (non_blocking, guard) = if handler.when != RollingPeriod::Never {
        if let Some(parent) = non_empty_parent(&path) {
            std::fs::create_dir_all(parent)?;
        }
        tracing_appender::non_blocking(rolling_appender(
            &path,
            handler.when,
            handler.backup_count,
        )?)
    } else {
        let sink = FileSink::open(&path, handler.mode)?
            .with_size_rotation(handler.max_bytes, handler.backup_count);
        tracing_appender::non_blocking(sink)
    };

    Ok((path, non_blocking, guard))
}

fn non_empty_parent(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}

fn fmt_layer<W, F>(writer: W, formatter: &FormatterConfig, plain: bool, filter: F) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    F: Filter<Registry> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(formatter.target)
        .with_thread_ids(formatter.thread_ids)
        .with_thread_names(formatter.thread_names)
        .with_line_number(formatter.line_number);
    let layer = if plain { layer.with_ansi(false) } else { layer };

    match formatter.format {
        FormatKind::Json => layer.json().with_filter(filter).boxed(),
        FormatKind::Text => layer.with_filter(filter).boxed(),
    }
}

/// Which targets reach the handler `name`, and from which level.
fn handler_targets(config: &LoggingConfig, name: &str, level: LevelFilter) -> Targets {
    let attached = |handlers: &[String]| handlers.iter().any(|h| h == name);
    let mut targets = Targets::new();

    if attached(&config.root.handlers) {
        targets = targets.with_default(level);
        for (target, logger) in &config.loggers {
            if !logger.propagate && !attached(&logger.handlers) {
                targets = targets.with_target(target.clone(), LevelFilter::OFF);
            }
        }
    }

    for (target, logger) in &config.loggers {
        if attached(&logger.handlers) {
            targets = targets.with_target(target.clone(), level);
        }
    }

    targets
}

/// Determine the filter directives, with `RUST_LOG` replacing the configured levels.
fn effective_log_spec(config: &LoggingConfig, rust_log: Option<&str>) -> Result<String> {
    if let Some(rust_log) = rust_log
        && !rust_log.is_empty()
    {
        return Ok(rust_log.to_string());
    }

    let mut directives = vec![directive_level(parse_level(&config.root.level)?)];
    for (target, logger) in &config.loggers {
        if let Some(level) = &logger.level {
            directives.push(format!(
                "{}={}",
                target,
                directive_level(parse_level(level)?)
            ));
        }
    }
    Ok(directives.join(","))
}

fn directive_level(level: LevelFilter) -> String {
    level.to_string().to_ascii_lowercase()
}
