//! Pattern rendering
//!
//! A pattern is compiled once into segments. Rendering walks the segments,
//! so text inserted for one token (a message containing `%DATE%`, say) is
//! never substituted again.

use super::LogLevel;
use crate::constants::{DEFAULT_DATE_FORMAT, DEFAULT_PATTERN};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use tracing::warn;

const TOKEN_DATE: &str = "%DATE%";
const TOKEN_TYPE: &str = "%TYPE%";
const TOKEN_MESSAGE: &str = "%MESSAGE%";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Date,
    Type,
    Message,
}

/// Renders log lines from a pattern and a chrono date format
#[derive(Debug, Clone)]
pub struct Formatter {
    pattern: String,
    date_format: String,
    segments: Vec<Segment>,
}

impl Formatter {
    /// Build a formatter. An unparsable `date_format` falls back to the default.
    pub fn new(pattern: impl Into<String>, date_format: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let mut date_format = date_format.into();
        if !is_valid_date_format(&date_format) {
            warn!(
                "Invalid date format {:?}, using {:?}",
                date_format, DEFAULT_DATE_FORMAT
            );
            date_format = DEFAULT_DATE_FORMAT.to_string();
        }
        let segments = compile(&pattern);
        Self {
            pattern,
            date_format,
            segments,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// Render one line for `level` at time `now`
    pub fn render(&self, level: LogLevel, message: &str, now: DateTime<Local>) -> String {
        let mut out = String::with_capacity(self.pattern.len() + message.len() + 16);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Date => out.push_str(&now.format(&self.date_format).to_string()),
                Segment::Type => out.push_str(level.as_str()),
                Segment::Message => out.push_str(message),
            }
        }
        out
    }

    /// Render one line followed by the error's type, source chain and backtrace
    pub fn render_with_error<E>(
        &self,
        level: LogLevel,
        message: &str,
        error: &E,
        now: DateTime<Local>,
    ) -> String
    where
        E: Error + ?Sized,
    {
        let mut out = self.render(level, message, now);
        out.push_str(&error_detail(short_type_name::<E>(), error));
        out
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN, DEFAULT_DATE_FORMAT)
    }
}

fn compile(pattern: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = pattern;

    while !rest.is_empty() {
        let token = [
            (TOKEN_DATE, Segment::Date),
            (TOKEN_TYPE, Segment::Type),
            (TOKEN_MESSAGE, Segment::Message),
        ]
        .into_iter()
        .find(|(text, _)| rest.starts_with(text));

        match token {
            Some((text, segment)) => {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(segment);
                rest = &rest[text.len()..];
            }
            None => {
                let mut chars = rest.chars();
                if let Some(c) = chars.next() {
                    literal.push(c);
                }
                rest = chars.as_str();
            }
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

fn is_valid_date_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

fn short_type_name<E: ?Sized>() -> &'static str {
    let full = std::any::type_name::<E>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

fn error_detail<E: Error + ?Sized>(type_name: &str, error: &E) -> String {
    let mut detail = format!("\n[Exception {}: {}]", type_name, error);

    let mut source = error.source();
    while let Some(cause) = source {
        detail.push_str(&format!("\n  caused by: {}", cause));
        source = cause.source();
    }

    let backtrace = Backtrace::capture();
    if backtrace.status() == BacktraceStatus::Captured {
        detail.push('\n');
        detail.push_str(&backtrace.to_string());
    }
    detail
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fmt;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(1999, 1, 1, 8, 30, 25).unwrap()
    }

    #[derive(Debug)]
    struct DiskFull;

    impl fmt::Display for DiskFull {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "no space left on device")
        }
    }

    impl Error for DiskFull {}

    #[test]
    fn test_default_pattern() {
        let line = Formatter::default().render(LogLevel::Error, "Example", fixed_time());
        assert_eq!(line, "[ ERROR: 01/01/1999 08:30:25 AM ]: Example");
    }

    #[test]
    fn test_custom_date_format() {
        let formatter = Formatter::new("%DATE% %TYPE% %MESSAGE%", "%Y-%m-%d");
        let line = formatter.render(LogLevel::Info, "up", fixed_time());
        assert_eq!(line, "1999-01-01 INFO up");
    }

    #[test]
    fn test_message_tokens_are_not_expanded() {
        let formatter = Formatter::new("%TYPE%: %MESSAGE%", DEFAULT_DATE_FORMAT);
        let line = formatter.render(LogLevel::Debug, "literal %DATE% and %TYPE%", fixed_time());
        assert_eq!(line, "DEBUG: literal %DATE% and %TYPE%");
    }

    #[test]
    fn test_repeated_and_partial_tokens() {
        let formatter = Formatter::new("%TYPE%%TYPE% %MESS %MESSAGE%%", DEFAULT_DATE_FORMAT);
        let line = formatter.render(LogLevel::Warn, "x", fixed_time());
        assert_eq!(line, "WARNWARN %MESS x%");
    }

    #[test]
    fn test_pattern_without_tokens() {
        let formatter = Formatter::new("static text", DEFAULT_DATE_FORMAT);
        assert_eq!(
            formatter.render(LogLevel::Fatal, "ignored", fixed_time()),
            "static text"
        );
    }

    #[test]
    fn test_invalid_date_format_falls_back() {
        let formatter = Formatter::new(DEFAULT_PATTERN, "%Q%");
        assert_eq!(formatter.date_format(), DEFAULT_DATE_FORMAT);
    }

    #[test]
    fn test_error_appends_second_line() {
        let formatter = Formatter::new("%TYPE%: %MESSAGE%", DEFAULT_DATE_FORMAT);
        let text = formatter.render_with_error(LogLevel::Error, "save failed", &DiskFull, fixed_time());
        let mut lines = text.lines();

        assert_eq!(lines.next(), Some("ERROR: save failed"));
        assert_eq!(
            lines.next(),
            Some("[Exception DiskFull: no space left on device]")
        );
    }

    #[test]
    fn test_error_includes_source_chain() {
        let inner = std::io::Error::new(std::io::ErrorKind::Other, "inner cause");
        let outer = crate::error::LoggerError::Worker { source: inner };
        let text = Formatter::default().render_with_error(LogLevel::Fatal, "boom", &outer, fixed_time());

        assert!(text.contains("[Exception LoggerError: Failed to start dump worker]"));
        assert!(text.contains("caused by: inner cause"));
    }
}
