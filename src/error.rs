use std::path::PathBuf;
use thiserror::Error as ThisError;

/// Errors raised while bootstrapping logging
#[derive(ThisError, Debug)]
pub enum Error {
    /// The configuration file could not be read.
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The configuration file is not valid JSON.
    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// The log directory could not be created.
    #[error("failed to create log directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A key expected by the patch is absent from the document.
    #[error("missing key `{0}` in config document")]
    MissingKey(String),
    /// A key on the patch path holds something other than an object.
    #[error("`{0}` is not an object in config document")]
    NotAnObject(String),
    /// The logging section does not have the expected shape.
    #[error("invalid logging section: {0}")]
    Json(#[from] serde_json::Error),
    /// The logging section is inconsistent (unknown handler, bad level, ...).
    #[error("Configuration error: {0}")]
    Config(String),
    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Installing the subscriber failed.
    #[error("Initialization error: {0}")]
    Init(String),
}

impl Error {
    /// True when the configuration file itself does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Read { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
