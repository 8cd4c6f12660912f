//! Where the log file lives.
//!
//! The directory is derived from `TMT_LOG_HOME` (falling back to `/tmp`) by
//! plain string joining, so `TMT_LOG_HOME=/var/log` yields
//! `/var/log/tmt/logs/app.log`.

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable holding the log home.
pub const LOG_HOME_ENV: &str = "TMT_LOG_HOME";
/// Log home used when the environment variable is unset or empty.
pub const DEFAULT_LOG_HOME: &str = "/tmp";
/// Directory appended to the log home.
pub const LOG_SUBDIR: &str = "/tmt/logs";
/// File name appended to the log directory.
pub const LOG_FILE_NAME: &str = "/app.log";

/// Resolved log directory and file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLocation {
    dir: String,
    file: String,
}

impl LogLocation {
    /// Resolve from `TMT_LOG_HOME`.
    ///
    /// The path ends up in a JSON string, so a home that is not valid UTF-8
    /// is an error rather than a fallback to `/tmp`.
    pub fn from_env() -> Result<Self> {
        let home = match std::env::var_os(LOG_HOME_ENV) {
            None => None,
            Some(home) => Some(home.into_string().map_err(|home| {
                Error::Config(format!(
                    "{LOG_HOME_ENV} is not valid UTF-8: {}",
                    home.to_string_lossy()
                ))
            })?),
        };
        Ok(Self::from_home(home.as_deref()))
    }

    /// Resolve from an explicit home; `None` and `""` mean `/tmp`.
    pub fn from_home(home: Option<&str>) -> Self {
        let home = home.filter(|h| !h.is_empty()).unwrap_or(DEFAULT_LOG_HOME);
        let dir = format!("{home}{LOG_SUBDIR}");
        let file = format!("{dir}{LOG_FILE_NAME}");
        Self { dir, file }
    }

    pub fn dir(&self) -> &Path {
        Path::new(&self.dir)
    }

    pub fn file(&self) -> &Path {
        Path::new(&self.file)
    }

    /// The file path exactly as it is written into the config document.
    pub fn file_str(&self) -> &str {
        &self.file
    }

    /// Create the log directory and any missing parents.
    pub fn ensure(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|source| Error::CreateDir {
            path: PathBuf::from(&self.dir),
            source,
        })?;
        tracing::debug!(dir = %self.dir, "log directory ready");
        Ok(())
    }
}
