//! Record formatting for sinks
//!
//! The engine never formats; sinks do, through the [`Formatter`] trait.
//! [`StandardFormatter`] covers the common cases:
//! - Text: `[2025-01-08T10:30:45.123Z] [INFO ] [main] Request processed`
//! - Json: one JSON object per record
//! - Logfmt: `timestamp=... level=INFO message="Request processed"`

use super::log_record::LogRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Turns a record into one line of output (without trailing newline)
pub trait Formatter: Send + Sync {
    fn format(&self, record: &LogRecord) -> String;
}

impl<F> Formatter for F
where
    F: Fn(&LogRecord) -> String + Send + Sync,
{
    fn format(&self, record: &LogRecord) -> String {
        self(record)
    }
}

/// Timestamp rendering
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,
    /// `2025-01-08T10:30:45.123456Z`
    Iso8601Micros,
    /// `2025-01-08T10:30:45.123456+00:00`
    Rfc3339,
    /// Seconds since the epoch
    Unix,
    /// Milliseconds since the epoch
    UnixMillis,
    /// Any strftime-compatible pattern, e.g. `%Y-%m-%d %H:%M:%S`
    Custom(String),
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Iso8601Micros => datetime.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::Unix => datetime.timestamp().to_string(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Custom(pattern) => datetime.format(pattern).to_string(),
        }
    }

    fn to_json(&self, datetime: &DateTime<Utc>) -> serde_json::Value {
        match self {
            TimestampFormat::Unix => datetime.timestamp().into(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().into(),
            _ => self.format(datetime).into(),
        }
    }
}

/// Output layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Logfmt,
}

/// Layout plus timestamp style, with optional source location
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StandardFormatter {
    pub output: OutputFormat,
    pub timestamp: TimestampFormat,
    pub include_location: bool,
}

impl StandardFormatter {
    pub fn new(output: OutputFormat) -> Self {
        Self {
            output,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: TimestampFormat) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn with_location(mut self, include: bool) -> Self {
        self.include_location = include;
        self
    }

    fn format_text(&self, record: &LogRecord) -> String {
        self.text_line(record, &format!("{:5}", record.level()))
    }

    /// Text layout with a caller-rendered level column (e.g. colored)
    pub(crate) fn text_line(&self, record: &LogRecord, level: &str) -> String {
        let mut line = format!(
            "[{}] [{}] [{}] {}",
            self.timestamp.format(record.timestamp()),
            level,
            record.thread_label(),
            record.message()
        );

        if self.include_location {
            if let (Some(file), Some(lineno)) = (record.file_name(), record.line()) {
                line.push_str(&format!(" ({}:{}", file, lineno));
                if let Some(function) = record.function() {
                    line.push(' ');
                    line.push_str(function);
                }
                line.push(')');
            }
        }
        line
    }

    fn format_json(&self, record: &LogRecord) -> String {
        let mut value = match serde_json::to_value(record) {
            Ok(value) => value,
            Err(_) => return self.format_text(record),
        };
        if let Some(object) = value.as_object_mut() {
            object.insert(
                "timestamp".to_string(),
                self.timestamp.to_json(record.timestamp()),
            );
            if !self.include_location {
                object.remove("file");
                object.remove("line");
                object.remove("function");
            }
        }
        value.to_string()
    }

    fn format_logfmt(&self, record: &LogRecord) -> String {
        let mut parts = vec![
            format!("timestamp={}", logfmt_value(&self.timestamp.format(record.timestamp()))),
            format!("level={}", record.level()),
            format!("message={}", quote(record.message())),
            format!("thread={}", logfmt_value(record.thread_label())),
        ];

        if self.include_location {
            if let Some(file) = record.file() {
                parts.push(format!("file={}", logfmt_value(file)));
            }
            if let Some(line) = record.line() {
                parts.push(format!("line={}", line));
            }
            if let Some(function) = record.function() {
                parts.push(format!("function={}", logfmt_value(function)));
            }
        }

        parts.join(" ")
    }
}

impl Formatter for StandardFormatter {
    fn format(&self, record: &LogRecord) -> String {
        match self.output {
            OutputFormat::Text => self.format_text(record),
            OutputFormat::Json => self.format_json(record),
            OutputFormat::Logfmt => self.format_logfmt(record),
        }
    }
}

/// Quote a logfmt value only when it needs it
fn logfmt_value(value: &str) -> String {
    if value.is_empty() || value.contains([' ', '"', '=']) {
        quote(value)
    } else {
        value.to_string()
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
