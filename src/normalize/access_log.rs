//! nginx Access Log Parser
//!
//! Matches a line against nginx `log_format` layouts, most specific first,
//! and maps the captured variables onto a fixed set of output fields.
//!
//! Failures come in two tiers:
//! - the line matches no layout: the whole line is rejected
//! - a field cannot be interpreted (placeholder `-`, bad number, bad
//!   timestamp, request that does not split in three): only that field is
//!   left out

use chrono::{DateTime, SecondsFormat, Utc};
use regex::{Captures, Regex};

use super::error::{ParseError, ParseResult};
use super::fields::{parse_finite_float, Fields};
use super::LineParser;

/// Default ingress-nginx controller format: combined plus upstream metadata
pub const INGRESS_FORMAT: &str = concat!(
    r#"$remote_addr - $remote_user [$time_local] "$request" "#,
    r#"$status $body_bytes_sent "$http_referer" "$http_user_agent" "#,
    r#"$request_length $request_time [$proxy_upstream_name] "#,
    r#"[$proxy_alternative_upstream_name] $upstream_addr "#,
    r#"$upstream_response_length $upstream_response_time "#,
    r#"$upstream_status $req_id"#,
);

/// Standard nginx `combined` format
pub const COMBINED_FORMAT: &str = concat!(
    r#"$remote_addr - $remote_user [$time_local] "$request" "#,
    r#"$status $body_bytes_sent "$http_referer" "$http_user_agent""#,
);

/// Source layout of `$time_local`
const TIME_LOCAL_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Value nginx writes for an unset variable
const PLACEHOLDER: &str = "-";

/// One nginx `log_format` compiled to a start-anchored regex
#[derive(Debug, Clone)]
pub struct LogLayout {
    name: &'static str,
    regex: Regex,
}

impl LogLayout {
    /// Compile a `log_format` template
    ///
    /// Each `$variable` becomes a named group that captures everything up to
    /// the literal character that follows it in the template; a trailing
    /// variable captures up to the next space. Only the start of the line is
    /// anchored, so text after the layout (extra `log_format` variables) is
    /// ignored.
    pub fn compile(name: &'static str, template: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&template_to_pattern(template))?;
        Ok(Self { name, regex })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn captures<'l>(&self, line: &'l str) -> Option<Captures<'l>> {
        self.regex.captures(line)
    }
}

fn template_to_pattern(template: &str) -> String {
    let mut pattern = String::from("^");
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        pattern.push_str(&regex::escape(&rest[..pos]));

        let after = &rest[pos + 1..];
        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        if name_len == 0 {
            pattern.push_str(r"\$");
            rest = after;
            continue;
        }

        let name = &after[..name_len];
        rest = &after[name_len..];
        match rest.chars().next() {
            Some(delimiter) => {
                let delimiter = regex::escape(delimiter.encode_utf8(&mut [0; 4]));
                pattern.push_str(&format!("(?P<{name}>[^{delimiter}]*)"));
            }
            None => pattern.push_str(&format!("(?P<{name}>[^ ]*)")),
        }
    }

    pattern.push_str(&regex::escape(rest));
    pattern
}

/// nginx access log parser trying the ingress layout, then combined
#[derive(Debug, Clone)]
pub struct AccessLogParser {
    layouts: Vec<LogLayout>,
}

impl AccessLogParser {
    /// Build the parser with the built-in layouts
    pub fn new() -> ParseResult<Self> {
        Ok(Self {
            layouts: vec![
                LogLayout::compile("ingress", INGRESS_FORMAT)?,
                LogLayout::compile("combined", COMBINED_FORMAT)?,
            ],
        })
    }

    /// Names of the layouts in the order they are tried
    pub fn layout_names(&self) -> Vec<&'static str> {
        self.layouts.iter().map(LogLayout::name).collect()
    }
}

impl LineParser for AccessLogParser {
    fn name(&self) -> &'static str {
        "nginx"
    }

    fn parse(&self, line: &str) -> ParseResult<Fields> {
        let captures = self
            .layouts
            .iter()
            .find_map(|layout| layout.captures(line))
            .ok_or(ParseError::NoLayoutMatched("nginx"))?;

        let mut out = FieldWriter::new(&captures);

        out.text("remote_addr", "remote_addr");
        out.text("remote_user", "remote_user");
        out.text("time_local", "time_local");
        out.text("request", "request");
        out.int("status", "status");
        out.int("body_bytes", "body_bytes_sent");
        out.text("http_referer", "http_referer");
        out.text("http_user_agent", "http_user_agent");

        if let Some(time) = out.raw("time_local").and_then(normalize_time_local) {
            out.fields.insert("time", time);
        }

        if let Some([method, path, version]) = out.raw("request").and_then(split_request) {
            out.fields.insert("method", method);
            out.fields.insert("path", path);
            out.fields.insert("http_version", version);
        }

        // ingress-only variables; absent from combined captures
        out.int("request_length", "request_length");
        out.float("request_time", "request_time");
        out.text("upstream_name", "proxy_upstream_name");
        out.text("upstream_alt_name", "proxy_alternative_upstream_name");
        out.text("upstream_addr", "upstream_addr");
        out.int("upstream_response_length", "upstream_response_length");
        // May list several timings ("0.010, 0.002") after retries
        out.text("upstream_response_time", "upstream_response_time");
        out.int("upstream_status", "upstream_status");
        out.text("request_id", "req_id");

        if out.fields.is_empty() {
            return Err(ParseError::Empty);
        }
        Ok(out.fields)
    }
}

/// Copies captured variables into output fields, skipping absent values
struct FieldWriter<'c, 'l> {
    captures: &'c Captures<'l>,
    fields: Fields,
}

impl<'c, 'l> FieldWriter<'c, 'l> {
    fn new(captures: &'c Captures<'l>) -> Self {
        Self {
            captures,
            fields: Fields::new(),
        }
    }

    /// Captured text, whatever it is
    fn raw(&self, variable: &str) -> Option<&'l str> {
        self.captures.name(variable).map(|m| m.as_str())
    }

    /// Captured text unless empty or the placeholder
    fn present(&self, variable: &str) -> Option<&'l str> {
        self.raw(variable)
            .filter(|value| !value.is_empty() && *value != PLACEHOLDER)
    }

    fn text(&mut self, key: &str, variable: &str) {
        if let Some(value) = self.present(variable) {
            self.fields.insert(key, value);
        }
    }

    fn int(&mut self, key: &str, variable: &str) {
        if let Some(n) = self.present(variable).and_then(|v| v.parse::<i64>().ok()) {
            self.fields.insert(key, n);
        }
    }

    fn float(&mut self, key: &str, variable: &str) {
        if let Some(f) = self.present(variable).and_then(parse_finite_float) {
            self.fields.insert(key, f);
        }
    }
}

/// Re-emit `$time_local` as RFC 3339 in UTC, e.g. `2023-10-10T11:55:36Z`
pub fn normalize_time_local(raw: &str) -> Option<String> {
    DateTime::parse_from_str(raw, TIME_LOCAL_FORMAT)
        .ok()
        .map(|t| t.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Split a request line on its first two spaces
///
/// Anything after the second space stays in the third component.
pub fn split_request(request: &str) -> Option<[&str; 3]> {
    let mut parts = request.splitn(3, ' ');
    Some([parts.next()?, parts.next()?, parts.next()?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::FieldValue;

    const INGRESS_LINE: &str = concat!(
        r#"192.168.1.10 - alice [10/Oct/2023:13:55:36 +0200] "GET /api/items?id=7 HTTP/1.1" "#,
        r#"200 1534 "https://example.com/" "Mozilla/5.0 (X11; Linux x86_64)" "#,
        r#"512 0.003 [default-web-80] [] 10.0.0.5:8080 1534 0.002 200 5f3c1a2b9d"#,
    );

    const COMBINED_LINE: &str = concat!(
        r#"127.0.0.1 - - [02/Jan/2006:15:04:05 -0700] "POST /login HTTP/2.0" "#,
        r#"302 - "-" "curl/8.0""#,
    );

    fn parse(line: &str) -> ParseResult<Fields> {
        AccessLogParser::new().unwrap().parse(line)
    }

    fn text(fields: &Fields, key: &str) -> Option<String> {
        match fields.get(key)? {
            FieldValue::Str(s) => Some(s.clone()),
            other => panic!("{key} is not a string: {other:?}"),
        }
    }

    #[test]
    fn test_template_to_pattern() {
        assert_eq!(
            template_to_pattern(r#"$a [$b] "$c" $d"#),
            r#"^(?P<a>[^ ]*) \[(?P<b>[^\]]*)\] "(?P<c>[^"]*)" (?P<d>[^ ]*)"#
        );
    }

    #[test]
    fn test_lone_dollar_is_literal() {
        let layout = LogLayout::compile("price", "cost $ $amount").unwrap();
        let captures = layout.captures("cost $ 12").unwrap();
        assert_eq!(&captures["amount"], "12");
    }

    #[test]
    fn test_layout_order() {
        assert_eq!(AccessLogParser::new().unwrap().layout_names(), vec!["ingress", "combined"]);
    }

    #[test]
    fn test_ingress_line() {
        let fields = parse(INGRESS_LINE).unwrap();

        assert_eq!(text(&fields, "remote_addr").as_deref(), Some("192.168.1.10"));
        assert_eq!(text(&fields, "remote_user").as_deref(), Some("alice"));
        assert_eq!(
            text(&fields, "time_local").as_deref(),
            Some("10/Oct/2023:13:55:36 +0200")
        );
        assert_eq!(text(&fields, "time").as_deref(), Some("2023-10-10T11:55:36Z"));
        assert_eq!(text(&fields, "method").as_deref(), Some("GET"));
        assert_eq!(text(&fields, "path").as_deref(), Some("/api/items?id=7"));
        assert_eq!(text(&fields, "http_version").as_deref(), Some("HTTP/1.1"));
        assert_eq!(fields.get("status"), Some(&FieldValue::Int(200)));
        assert_eq!(fields.get("body_bytes"), Some(&FieldValue::Int(1534)));
        assert_eq!(
            text(&fields, "http_user_agent").as_deref(),
            Some("Mozilla/5.0 (X11; Linux x86_64)")
        );
        assert_eq!(fields.get("request_length"), Some(&FieldValue::Int(512)));
        assert_eq!(fields.get("request_time"), Some(&FieldValue::Float(0.003)));
        assert_eq!(text(&fields, "upstream_name").as_deref(), Some("default-web-80"));
        assert!(!fields.contains_key("upstream_alt_name"));
        assert_eq!(text(&fields, "upstream_addr").as_deref(), Some("10.0.0.5:8080"));
        assert_eq!(
            fields.get("upstream_response_length"),
            Some(&FieldValue::Int(1534))
        );
        assert_eq!(text(&fields, "upstream_response_time").as_deref(), Some("0.002"));
        assert_eq!(fields.get("upstream_status"), Some(&FieldValue::Int(200)));
        assert_eq!(text(&fields, "request_id").as_deref(), Some("5f3c1a2b9d"));
    }

    #[test]
    fn test_combined_line() {
        let fields = parse(COMBINED_LINE).unwrap();

        assert_eq!(text(&fields, "remote_addr").as_deref(), Some("127.0.0.1"));
        assert_eq!(text(&fields, "time").as_deref(), Some("2006-01-02T22:04:05Z"));
        assert_eq!(text(&fields, "method").as_deref(), Some("POST"));
        assert_eq!(fields.get("status"), Some(&FieldValue::Int(302)));
        assert_eq!(text(&fields, "http_user_agent").as_deref(), Some("curl/8.0"));

        for absent in ["remote_user", "body_bytes", "http_referer", "request_length", "request_id"] {
            assert!(!fields.contains_key(absent), "{absent} should be omitted");
        }
    }

    #[test]
    fn test_main_format_matches_combined_prefix() {
        // nginx default `main` format: combined plus "$http_x_forwarded_for"
        let line = format!(r#"{COMBINED_LINE} "203.0.113.9""#);
        let fields = parse(&line).unwrap();

        assert_eq!(text(&fields, "method").as_deref(), Some("POST"));
        assert_eq!(text(&fields, "path").as_deref(), Some("/login"));
        assert_eq!(fields.get("status"), Some(&FieldValue::Int(302)));
        assert_eq!(text(&fields, "time").as_deref(), Some("2006-01-02T22:04:05Z"));
        assert_eq!(text(&fields, "http_user_agent").as_deref(), Some("curl/8.0"));
        assert!(!fields.contains_key("request_length"));
    }

    #[test]
    fn test_trailing_text_after_ingress_layout_is_ignored() {
        let line = format!("{INGRESS_LINE} extra=1 trailing");
        let fields = parse(&line).unwrap();

        assert_eq!(text(&fields, "request_id").as_deref(), Some("5f3c1a2b9d"));
        assert_eq!(fields.get("upstream_status"), Some(&FieldValue::Int(200)));
        assert_eq!(text(&fields, "upstream_name").as_deref(), Some("default-web-80"));
    }

    #[test]
    fn test_malformed_timestamp_omits_time_only() {
        let line = INGRESS_LINE.replace("10/Oct/2023:13:55:36 +0200", "yesterday-ish");
        let fields = parse(&line).unwrap();

        assert!(!fields.contains_key("time"));
        assert_eq!(text(&fields, "time_local").as_deref(), Some("yesterday-ish"));
        assert_eq!(text(&fields, "method").as_deref(), Some("GET"));
    }

    #[test]
    fn test_unsplittable_request_omits_request_parts() {
        let line = COMBINED_LINE.replace("POST /login HTTP/2.0", "garbage");
        let fields = parse(&line).unwrap();

        assert_eq!(text(&fields, "request").as_deref(), Some("garbage"));
        for absent in ["method", "path", "http_version"] {
            assert!(!fields.contains_key(absent), "{absent} should be omitted");
        }
        assert!(fields.contains_key("time"));
    }

    #[test]
    fn test_placeholders_are_omitted() {
        let line = concat!(
            r#"10.1.1.1 - - [-] "-" - - "-" "-" "#,
            r#"- - [-] [-] - - - - -"#,
        );
        let fields = parse(line).unwrap();

        assert_eq!(fields.len(), 1);
        assert_eq!(text(&fields, "remote_addr").as_deref(), Some("10.1.1.1"));
    }

    #[test]
    fn test_all_placeholders_is_empty() {
        let line = r#"- - - [-] "-" - - "-" "-""#;
        assert_eq!(parse(line), Err(ParseError::Empty));
    }

    #[test]
    fn test_non_numeric_status_is_omitted() {
        let line = COMBINED_LINE.replace(" 302 ", " abc ");
        let fields = parse(&line).unwrap();
        assert!(!fields.contains_key("status"));
        assert!(fields.contains_key("remote_addr"));
    }

    #[test]
    fn test_unmatched_line() {
        assert_eq!(
            parse("Starting nginx worker process"),
            Err(ParseError::NoLayoutMatched("nginx"))
        );
        assert_eq!(parse(""), Err(ParseError::NoLayoutMatched("nginx")));
    }

    #[test]
    fn test_split_request() {
        assert_eq!(split_request("GET / HTTP/1.1"), Some(["GET", "/", "HTTP/1.1"]));
        assert_eq!(split_request("GET / HTTP/1.1 x"), Some(["GET", "/", "HTTP/1.1 x"]));
        assert_eq!(split_request("GET  /"), Some(["GET", "", "/"]));
        assert_eq!(split_request("GET /"), None);
        assert_eq!(split_request("-"), None);
    }

    #[test]
    fn test_normalize_time_local() {
        assert_eq!(
            normalize_time_local("02/Jan/2006:15:04:05 -0700").as_deref(),
            Some("2006-01-02T22:04:05Z")
        );
        assert_eq!(
            normalize_time_local("31/Dec/2023:23:30:00 -0100").as_deref(),
            Some("2024-01-01T00:30:00Z")
        );
        assert_eq!(normalize_time_local("2006-01-02T15:04:05Z"), None);
        assert_eq!(normalize_time_local("-"), None);
    }
}
