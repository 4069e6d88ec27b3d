//! Console sink implementation

use crate::core::{
    Formatter, LogLevel, LogRecord, OutputFormat, Result, Sink, SinkLevel, StandardFormatter,
    TimestampFormat,
};
use colored::Colorize;
use std::io::Write;

/// Writes records to stdout, or stderr for `Error` and `Fatal`.
pub struct ConsoleSink {
    use_colors: bool,
    formatter: StandardFormatter,
    level: SinkLevel,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::with_colors(true)
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            formatter: StandardFormatter::default(),
            level: SinkLevel::default(),
        }
    }

    /// Set the output format for this sink
    ///
    /// # Example
    ///
    /// ```
    /// use rust_log_engine::sinks::ConsoleSink;
    /// use rust_log_engine::OutputFormat;
    ///
    /// let sink = ConsoleSink::new().with_output_format(OutputFormat::Json);
    /// ```
    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.formatter.output = format;
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.formatter.timestamp = format;
        self
    }

    /// Append `(file:line function)` to text lines when the record has a location
    #[must_use]
    pub fn with_location(mut self, include: bool) -> Self {
        self.formatter.include_location = include;
        self
    }

    #[must_use]
    pub fn with_level(self, level: LogLevel) -> Self {
        self.level.set(level);
        self
    }

    fn render(&self, record: &LogRecord) -> String {
        if self.use_colors && self.formatter.output == OutputFormat::Text {
            let level = format!("{:5}", record.level())
                .color(record.level().color_code())
                .to_string();
            self.formatter.text_line(record, &level)
        } else {
            self.formatter.format(record)
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for ConsoleSink {
    fn log(&self, record: &LogRecord) -> Result<()> {
        let line = self.render(record);

        // Error and Fatal go to stderr, everything else to stdout
        match record.level() {
            LogLevel::Error | LogLevel::Fatal => writeln!(std::io::stderr().lock(), "{}", line)?,
            _ => writeln!(std::io::stdout().lock(), "{}", line)?,
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn level(&self) -> LogLevel {
        self.level.get()
    }

    fn set_level(&self, level: LogLevel) {
        self.level.set(level)
    }

    fn name(&self) -> &str {
        "console"
    }
}
