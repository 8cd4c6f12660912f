//! File destinations for file handlers.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing_appender::rolling::{RollingFileAppender, Rotation};

use crate::config::{FileMode, RollingPeriod};
use crate::{Error, Result};

/// A log file that optionally rotates by size.
///
/// Rotation renames `app.log` to `app.log.1`, shifting older backups up by
/// one and dropping anything past `backup_count`. With no backups the file is
/// truncated in place.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: File,
    size: u64,
    max_bytes: u64,
    backup_count: usize,
}

impl FileSink {
    /// Open `path`, creating parent directories as needed.
    pub fn open(path: &Path, mode: FileMode) -> io::Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let file = open_file(path, mode)?;
        let size = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            size,
            max_bytes: 0,
            backup_count: 0,
        })
    }

    /// Rotate once a write would take the file past `max_bytes`; 0 disables.
    pub fn with_size_rotation(mut self, max_bytes: u64, backup_count: usize) -> Self {
        self.max_bytes = max_bytes;
        self.backup_count = backup_count;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn needs_rotation(&self, incoming: usize) -> bool {
        self.max_bytes > 0 && self.size > 0 && self.size + incoming as u64 > self.max_bytes
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        PathBuf::from(format!("{}.{}", self.path.display(), index))
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.backup_count > 0 {
            for i in (1..self.backup_count).rev() {
                let from = self.backup_path(i);
                if from.exists() {
                    replace(&from, &self.backup_path(i + 1))?;
                }
            }
            replace(&self.path, &self.backup_path(1))?;
        }

        self.file = open_file(&self.path, FileMode::Truncate)?;
        self.size = 0;
        Ok(())
    }
}

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.needs_rotation(buf.len()) {
            self.rotate()?;
        }
        let written = self.file.write(buf)?;
        self.size += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn replace(from: &Path, to: &Path) -> io::Result<()> {
    if to.exists() {
        std::fs::remove_file(to)?;
    }
    std::fs::rename(from, to)
}

fn open_file(path: &Path, mode: FileMode) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true);
    match mode {
        FileMode::Append => options.append(true),
        FileMode::Truncate => options.write(true).truncate(true),
    };
    options.open(path)
}

/// Build a time-rotated appender writing `<file name>.<date>` next to `path`.
pub fn rolling_appender(
    path: &Path,
    period: RollingPeriod,
    backup_count: usize,
) -> Result<RollingFileAppender> {
    let rotation = match period {
        RollingPeriod::Never => Rotation::NEVER,
        RollingPeriod::Minutely => Rotation::MINUTELY,
        RollingPeriod::Hourly => Rotation::HOURLY,
        RollingPeriod::Daily => Rotation::DAILY,
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let prefix = path
        .file_name()
        .ok_or_else(|| Error::Config(format!("log file {} has no file name", path.display())))?
        .to_string_lossy()
        .into_owned();

    let mut builder = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(prefix);
    if backup_count > 0 {
        builder = builder.max_log_files(backup_count);
    }

    builder
        .build(dir)
        .map_err(|e| Error::Init(format!("rolling appender for {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_sink_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested/inner");
        let log_path = nested.join("test.log");
        assert!(!nested.exists());

        let mut sink = FileSink::open(&log_path, FileMode::Append).expect("open sink");
        assert_eq!(sink.path(), log_path.as_path());
        sink.write_all(b"hello parent\n").unwrap();
        sink.flush().unwrap();

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("hello parent"));
    }

    #[test]
    fn test_file_sink_appends_or_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("test.log");
        std::fs::write(&log_path, "existing content\n").unwrap();

        let mut sink = FileSink::open(&log_path, FileMode::Append).unwrap();
        sink.write_all(b"new content\n").unwrap();
        drop(sink);
        let content = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(content, "existing content\nnew content\n");

        let mut sink = FileSink::open(&log_path, FileMode::Truncate).unwrap();
        sink.write_all(b"fresh\n").unwrap();
        drop(sink);
        assert_eq!(std::fs::read_to_string(&log_path).unwrap(), "fresh\n");
    }

    #[test]
    fn test_size_rotation_keeps_backup_count() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("test.log");

        let mut sink = FileSink::open(&log_path, FileMode::Append)
            .unwrap()
            .with_size_rotation(20, 2);
        for i in 0..5 {
            sink.write_all(format!("line {i} padding...\n").as_bytes())
                .unwrap();
        }
        sink.flush().unwrap();

        // Two lines exceed 20 bytes, so every write after the first rotates.
        assert_eq!(std::fs::read_to_string(&log_path).unwrap(), "line 4 padding...\n");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("test.log.1")).unwrap(),
            "line 3 padding...\n"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("test.log.2")).unwrap(),
            "line 2 padding...\n"
        );
        assert!(!dir.path().join("test.log.3").exists());
    }

    #[test]
    fn test_size_rotation_without_backups_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("test.log");

        let mut sink = FileSink::open(&log_path, FileMode::Append)
            .unwrap()
            .with_size_rotation(10, 0);
        sink.write_all(b"first line\n").unwrap();
        sink.write_all(b"second line\n").unwrap();
        sink.flush().unwrap();

        assert_eq!(std::fs::read_to_string(&log_path).unwrap(), "second line\n");
        assert!(!dir.path().join("test.log.1").exists());
    }

    #[test]
    fn test_rolling_appender_uses_file_name_as_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("app.log");

        let mut appender = rolling_appender(&log_path, RollingPeriod::Daily, 3).unwrap();
        appender.write_all(b"rolled\n").unwrap();
        appender.flush().unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert!(
            names.iter().any(|n| n.starts_with("app.log.")),
            "expected a dated app.log file, found {names:?}"
        );
    }
}
