//! Log event types
//!
//! What subscribers and sinks receive for every emitted line.

use super::LogLevel;
use serde::{Deserialize, Serialize};

/// One emitted line (serializable for `--events` output)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub level: LogLevel,
    /// RFC 3339 local time at which the line was rendered
    pub timestamp: String,
    /// Exact rendered text, as written to the file
    pub line: String,
}

impl LogEvent {
    pub fn new(level: LogLevel, timestamp: chrono::DateTime<chrono::Local>, line: String) -> Self {
        Self {
            level,
            timestamp: timestamp.to_rfc3339_opts(chrono::SecondsFormat::Millis, false),
            line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_fields() {
        let event = LogEvent::new(
            LogLevel::Warn,
            chrono::Local::now(),
            "[ WARN: now ]: disk almost full".to_string(),
        );
        let json = serde_json::to_string(&event).unwrap();

        assert!(json.contains("\"level\":\"warn\""));
        assert!(json.contains("\"timestamp\""));
        assert!(json.contains("disk almost full"));
    }
}
