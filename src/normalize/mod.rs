//! Line Normalization
//!
//! Turns recognized structured log lines into single-line JSON objects.
//! Anything that does not parse is passed through verbatim.
//!
//! ## Formats
//!
//! - `none`: pass-through, nothing is parsed
//! - `logfmt`: `key=value` pairs with typed values
//! - `nginx`: ingress-nginx or `combined` access log lines
//!
//! ## Example
//!
//! ```rust
//! use leno::normalize::{LogFormat, Normalizer};
//!
//! let normalizer = Normalizer::new(LogFormat::Logfmt).unwrap();
//!
//! let json = normalizer.normalize("status=200 ok=true").unwrap();
//! assert_eq!(json, r#"{"ok":true,"status":200}"#);
//!
//! // Unparseable lines fall back to the raw text
//! let record = normalizer.record(r#"oops="unterminated"#.to_string());
//! assert_eq!(record.as_str(), r#"oops="unterminated"#);
//! ```

mod access_log;
mod error;
mod fields;
mod logfmt;

pub use access_log::{
    normalize_time_local, split_request, AccessLogParser, LogLayout, COMBINED_FORMAT,
    INGRESS_FORMAT,
};
pub use error::{ParseError, ParseResult};
pub use fields::{FieldValue, Fields};
pub use logfmt::{parse_pairs, LogfmtParser};

use std::fmt;

use clap::ValueEnum;
use serde::Deserialize;

use crate::hub::Record;

/// Input format selected at startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Broadcast lines as they are
    #[default]
    #[serde(rename = "none", alias = "disabled", alias = "")]
    #[value(name = "none", alias = "disabled")]
    Disabled,
    /// logfmt `key=value` lines
    Logfmt,
    /// nginx access log lines
    Nginx,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Disabled => "none",
            LogFormat::Logfmt => "logfmt",
            LogFormat::Nginx => "nginx",
        }
    }

    /// Parse a user-supplied name; an empty string means disabled
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Some(LogFormat::Disabled);
        }
        <Self as ValueEnum>::from_str(name, true).ok()
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parser for one structured log format
///
/// Implementations hold no per-line state; every call stands alone.
pub trait LineParser {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Parse a line into fields, or explain why it does not match
    fn parse(&self, line: &str) -> ParseResult<Fields>;
}

/// The normalization strategy for the whole process
#[derive(Debug, Clone)]
pub enum Normalizer {
    Disabled,
    Logfmt(LogfmtParser),
    Nginx(AccessLogParser),
}

impl Normalizer {
    /// Build the normalizer for a format
    pub fn new(format: LogFormat) -> ParseResult<Self> {
        Ok(match format {
            LogFormat::Disabled => Normalizer::Disabled,
            LogFormat::Logfmt => Normalizer::Logfmt(LogfmtParser::new()),
            LogFormat::Nginx => Normalizer::Nginx(AccessLogParser::new()?),
        })
    }

    pub fn format(&self) -> LogFormat {
        match self {
            Normalizer::Disabled => LogFormat::Disabled,
            Normalizer::Logfmt(_) => LogFormat::Logfmt,
            Normalizer::Nginx(_) => LogFormat::Nginx,
        }
    }

    fn parser(&self) -> Option<&dyn LineParser> {
        match self {
            Normalizer::Disabled => None,
            Normalizer::Logfmt(parser) => Some(parser),
            Normalizer::Nginx(parser) => Some(parser),
        }
    }

    /// Normalize a line to JSON
    ///
    /// Returns `None` when normalization is disabled or the line does not
    /// match; the caller then uses the raw line.
    pub fn normalize(&self, line: &str) -> Option<String> {
        let parser = self.parser()?;

        let result = parser.parse(line).and_then(|fields| {
            if fields.is_empty() {
                return Err(ParseError::Empty);
            }
            fields.to_json()
        });

        match result {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::trace!(format = parser.name(), error = %e, "Line passed through unparsed");
                None
            }
        }
    }

    /// Produce the record to broadcast for a line
    pub fn record(&self, line: String) -> Record {
        match self.normalize(&line) {
            Some(json) => Record::from(json),
            None => Record::from(line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_names() {
        assert_eq!(LogFormat::from_name("nginx"), Some(LogFormat::Nginx));
        assert_eq!(LogFormat::from_name("LOGFMT"), Some(LogFormat::Logfmt));
        assert_eq!(LogFormat::from_name("none"), Some(LogFormat::Disabled));
        assert_eq!(LogFormat::from_name("disabled"), Some(LogFormat::Disabled));
        assert_eq!(LogFormat::from_name(""), Some(LogFormat::Disabled));
        assert_eq!(LogFormat::from_name("apache"), None);
        assert_eq!(LogFormat::default(), LogFormat::Disabled);
        assert_eq!(LogFormat::Nginx.to_string(), "nginx");
    }

    #[derive(Deserialize)]
    struct Wrapper {
        format: LogFormat,
    }

    #[test]
    fn test_log_format_deserialize() {
        let parsed: Wrapper = toml::from_str(r#"format = "logfmt""#).unwrap();
        assert_eq!(parsed.format, LogFormat::Logfmt);

        let parsed: Wrapper = toml::from_str(r#"format = "none""#).unwrap();
        assert_eq!(parsed.format, LogFormat::Disabled);

        assert!(toml::from_str::<Wrapper>(r#"format = "syslog""#).is_err());
    }

    #[test]
    fn test_disabled_never_matches() {
        let normalizer = Normalizer::new(LogFormat::Disabled).unwrap();
        assert_eq!(normalizer.format(), LogFormat::Disabled);
        assert_eq!(normalizer.normalize("level=info"), None);
        assert_eq!(normalizer.record("level=info".into()).as_str(), "level=info");
    }

    #[test]
    fn test_logfmt_record_is_json() {
        let normalizer = Normalizer::new(LogFormat::Logfmt).unwrap();
        let record = normalizer.record(r#"level=info msg="hello world" latency=1.23"#.into());
        assert_eq!(
            record.as_str(),
            r#"{"latency":1.23,"level":"info","msg":"hello world"}"#
        );
    }

    #[test]
    fn test_logfmt_empty_line_falls_back() {
        let normalizer = Normalizer::new(LogFormat::Logfmt).unwrap();
        assert_eq!(normalizer.normalize(""), None);
        assert_eq!(normalizer.record(String::new()).as_str(), "");
    }

    #[test]
    fn test_nginx_unmatched_line_falls_back() {
        let normalizer = Normalizer::new(LogFormat::Nginx).unwrap();
        let line = "2023/10/10 13:55:36 [notice] 1#1: start worker processes";
        assert_eq!(normalizer.normalize(line), None);
        assert_eq!(normalizer.record(line.to_string()).as_str(), line);
    }

    #[test]
    fn test_nginx_record_is_json() {
        let normalizer = Normalizer::new(LogFormat::Nginx).unwrap();
        let line = r#"127.0.0.1 - - [02/Jan/2006:15:04:05 -0700] "GET / HTTP/1.1" 200 612 "-" "curl/8.0""#;

        let json = normalizer.normalize(line).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], 200);
        assert_eq!(value["path"], "/");
        assert_eq!(value["time"], "2006-01-02T22:04:05Z");
        assert!(value.get("http_referer").is_none());
    }
}
