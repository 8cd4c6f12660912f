//! Builder for bootstrapping logging from a configuration file.
//!
//! The bootstrap reads the JSON document, makes sure the log directory exists,
//! points the file handler at `<log dir>/app.log` and hands the `logging`
//! section to [`dispatch::configure`](crate::dispatch::configure).
//!
//! # Example
//!
//! ```rust,no_run
//! // Reads ./logging.json and logs under $TMT_LOG_HOME/tmt/logs
//! let _handle = tmtlog::init().expect("Failed to initialize logging");
//!
//! // Explicit file and log home
//! let _handle = tmtlog::builder()
//!     .with_config_path("/etc/tmt/logging.json")
//!     .with_log_home("/var/log")
//!     .init()
//!     .expect("Failed to initialize logging");
//! ```

use crate::dispatch::{self, LoggingHandle};
use crate::{ConfigDocument, LogLocation, LoggingConfig, Result};
use std::path::PathBuf;

/// Configuration file read when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "logging.json";
/// Handler whose `filename` is replaced with the computed log file.
pub const DEFAULT_FILE_HANDLER: &str = "file_handler";
/// Top-level section handed to the dispatch routine.
pub const LOGGING_SECTION: &str = "logging";

/// A builder for bootstrapping logging.
///
/// This provides a fluent interface for locating the configuration file and
/// the log directory, then loading and installing the configuration.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    config_path: PathBuf,
    log_home: Option<String>,
    file_handler: String,
}

/// A loaded and patched logging section, ready to be installed.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub config: LoggingConfig,
    pub location: LogLocation,
}

impl Prepared {
    /// Install the configuration as the process-wide subscriber.
    pub fn install(self) -> Result<LoggingHandle> {
        dispatch::configure(self.config)
    }
}

impl Bootstrap {
    /// Create a Bootstrap with default settings.
    pub fn new() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            log_home: None,
            file_handler: DEFAULT_FILE_HANDLER.to_string(),
        }
    }

    /// Read the configuration from `path` instead of `logging.json`.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = path.into();
        self
    }

    /// Use `home` instead of `TMT_LOG_HOME`.
    pub fn with_log_home(mut self, home: impl Into<String>) -> Self {
        self.log_home = Some(home.into());
        self
    }

    /// Patch the handler called `name` instead of `file_handler`.
    pub fn with_file_handler(mut self, name: impl Into<String>) -> Self {
        self.file_handler = name.into();
        self
    }

    pub fn config_path(&self) -> &std::path::Path {
        &self.config_path
    }

    /// Resolve the log location from the explicit home or the environment.
    pub fn location(&self) -> Result<LogLocation> {
        match &self.log_home {
            Some(home) => Ok(LogLocation::from_home(Some(home.as_str()))),
            None => LogLocation::from_env(),
        }
    }

    /// Load, patch and parse the configuration without touching global state.
    ///
    /// The steps run in a fixed order, so a malformed file fails before the
    /// log directory is created, and a missing handler fails after it.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file is missing or is not valid JSON
    /// - The log directory cannot be created
    /// - The document has no `logging.handlers.<file handler>` object
    /// - The `logging` section has the wrong shape
    pub fn prepare(&self) -> Result<Prepared> {
        let mut document = ConfigDocument::load(&self.config_path)?;

        let location = self.location()?;
        location.ensure()?;

        document.set(
            &[
                LOGGING_SECTION,
                "handlers",
                self.file_handler.as_str(),
                "filename",
            ],
            location.file_str(),
        )?;
        tracing::debug!(
            handler = %self.file_handler,
            file = location.file_str(),
            "file handler patched"
        );

        let config = serde_json::from_value(document.take(LOGGING_SECTION)?)?;
        Ok(Prepared { config, location })
    }

    /// Prepare and install the configuration.
    ///
    /// This consumes the builder and initializes the global logging system.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - [`prepare`](Self::prepare) fails
    /// - The tracing subscriber is already initialized
    /// - A log file cannot be opened
    pub fn init(self) -> Result<LoggingHandle> {
        self.prepare()?.install()
    }
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self::new()
    }
}
