//! # tmtlog
//!
//! Bootstraps process-wide logging from a JSON configuration document.
//!
//! ## Features
//!
//! - Loads `logging.json` and points its file handler at
//!   `$TMT_LOG_HOME/tmt/logs/app.log` (`/tmp` when unset)
//! - Declarative formatters, handlers and loggers in the `logging` section
//! - Console and file handlers, with size or time based rotation
//! - Integration with the `tracing` ecosystem
//!
//! ## Example
//!
//! ```rust,no_run
//! let _handle = tmtlog::builder()
//!     .with_config_path("logging.json")
//!     .init()?;
//!
//! tracing::info!("This is an info message");
//! # Ok::<(), tmtlog::Error>(())
//! ```

pub mod builder;
pub mod config;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod location;
pub mod writer;

pub use builder::{Bootstrap, Prepared};
pub use config::{
    FormatKind, FormatterConfig, HandlerConfig, LoggerConfig, LoggingConfig, RootConfig,
    parse_level,
};
pub use dispatch::LoggingHandle;
pub use document::ConfigDocument;
pub use error::{Error, Result};
pub use location::LogLocation;
pub use writer::FileSink;

/// Start configuring the bootstrap.
pub fn builder() -> Bootstrap {
    Bootstrap::new()
}

/// Bootstrap logging with the defaults: `logging.json` in the working
/// directory and the log home from `TMT_LOG_HOME`.
///
/// Call once at startup and keep the returned handle alive.
pub fn init() -> Result<LoggingHandle> {
    builder().init()
}
