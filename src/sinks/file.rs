//! File sink implementation

use crate::core::{
    Formatter, LogLevel, LogRecord, LoggerError, OutputFormat, Result, Sink, SinkLevel,
    StandardFormatter, TimestampFormat,
};
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Appends formatted records to a file through a buffered writer.
///
/// The file is opened in append mode and held under an exclusive advisory
/// lock for the life of the sink, so two processes cannot interleave lines
/// in the same log. Buffered data is written on `flush` and on drop.
pub struct FileSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
    formatter: StandardFormatter,
    level: SinkLevel,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| LoggerError::file_sink(path.display().to_string(), e.to_string()))?;

        file.try_lock_exclusive()
            .map_err(|_| LoggerError::file_lock(path.display().to_string()))?;

        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
            formatter: StandardFormatter::default().with_location(true),
            level: SinkLevel::default(),
        })
    }

    /// Set the timestamp format for this sink
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rust_log_engine::sinks::FileSink;
    /// use rust_log_engine::TimestampFormat;
    ///
    /// let sink = FileSink::new("/var/log/app.log")
    ///     .unwrap()
    ///     .with_timestamp_format(TimestampFormat::Rfc3339);
    /// ```
    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.formatter.timestamp = format;
        self
    }

    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.formatter.output = format;
        self
    }

    #[must_use]
    pub fn with_level(self, level: LogLevel) -> Self {
        self.level.set(level);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for FileSink {
    fn log(&self, record: &LogRecord) -> Result<()> {
        let mut line = self.formatter.format(record);
        line.push('\n');

        self.writer
            .lock()
            .write_all(line.as_bytes())
            .map_err(|e| LoggerError::io_operation("writing record", self.path.display().to_string(), e))
    }

    fn flush(&self) -> Result<()> {
        self.writer
            .lock()
            .flush()
            .map_err(|e| LoggerError::io_operation("flushing", self.path.display().to_string(), e))
    }

    fn level(&self) -> LogLevel {
        self.level.get()
    }

    fn set_level(&self, level: LogLevel) {
        self.level.set(level)
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        let writer = self.writer.get_mut();
        if let Err(e) = writer.flush() {
            eprintln!(
                "[LOGGER ERROR] Failed to flush '{}' on drop: {}",
                self.path.display(),
                e
            );
        }
        let _ = writer.get_ref().unlock();
    }
}

impl std::fmt::Debug for FileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSink")
            .field("path", &self.path)
            .field("level", &self.level.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writes_after_flush() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let sink = FileSink::new(&path).unwrap();

        sink.log(&LogRecord::new(LogLevel::Info, "first")).unwrap();
        sink.log(&LogRecord::new(LogLevel::Error, "second").with_location("src/main.rs", 7, "main"))
            .unwrap();
        sink.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("first"));
        assert!(lines[1].ends_with("second (main.rs:7 main)"));
    }

    #[test]
    fn test_drop_flushes_buffer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("drop.log");
        {
            let sink = FileSink::new(&path).unwrap();
            sink.log(&LogRecord::new(LogLevel::Warn, "buffered")).unwrap();
        }
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("buffered"));
    }

    #[test]
    fn test_appends_to_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("existing.log");
        std::fs::write(&path, "previous\n").unwrap();

        let sink = FileSink::new(&path).unwrap();
        sink.log(&LogRecord::new(LogLevel::Info, "next")).unwrap();
        drop(sink);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("previous\n"));
        assert!(content.trim_end().ends_with("next"));
    }

    #[test]
    fn test_second_sink_on_same_file_is_locked_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("locked.log");
        let _first = FileSink::new(&path).unwrap();

        assert!(matches!(
            FileSink::new(&path),
            Err(LoggerError::FileLockError { .. })
        ));
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        let err = FileSink::new(dir.path().join("missing/app.log")).unwrap_err();
        assert!(matches!(err, LoggerError::FileSinkError { .. }));
    }

    #[test]
    fn test_json_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.jsonl");
        let sink = FileSink::new(&path)
            .unwrap()
            .with_output_format(OutputFormat::Json);
        sink.log(&LogRecord::new(LogLevel::Info, "structured")).unwrap();
        sink.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(parsed["level"], "INFO");
    }
}
