//! logfmt Parser
//!
//! Parses `key=value` lines into typed fields.
//!
//! # Supported Syntax
//!
//! ```text
//! key=value key="quoted value" key= bare
//! ```
//!
//! - keys and bare values are runs of characters above space, excluding `=` and `"`
//! - quoted values support JSON-style escapes (`\" \\ \/ \b \f \n \r \t \uXXXX`)
//! - `key=` yields an empty string, a bare `key` does too
//! - pairs are whitespace separated, but a key may directly follow a closing quote
//!
//! A malformed token anywhere on the line rejects the whole line.

use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, take_while, take_while1, take_while_m_n},
    character::complete::char,
    combinator::{map, map_res, opt, value},
    sequence::{delimited, preceded},
    IResult,
};

use super::error::{ParseError, ParseResult};
use super::fields::{FieldValue, Fields};
use super::LineParser;

/// Stateless logfmt line parser
#[derive(Debug, Clone, Copy, Default)]
pub struct LogfmtParser;

impl LogfmtParser {
    pub fn new() -> Self {
        Self
    }
}

impl LineParser for LogfmtParser {
    fn name(&self) -> &'static str {
        "logfmt"
    }

    fn parse(&self, line: &str) -> ParseResult<Fields> {
        let pairs = parse_pairs(line)?;
        if pairs.is_empty() {
            return Err(ParseError::Empty);
        }

        let mut fields = Fields::new();
        for (key, raw) in pairs {
            fields.insert(key, FieldValue::coerce(&raw));
        }
        Ok(fields)
    }
}

/// Split a line into raw `(key, value)` pairs without type coercion
pub fn parse_pairs(line: &str) -> ParseResult<Vec<(&str, String)>> {
    match parse_record(line) {
        Ok(("", pairs)) => Ok(pairs),
        Ok((remaining, _)) => {
            let offset = line.len() - remaining.len();
            match remaining.chars().next() {
                Some(found) => Err(ParseError::UnexpectedChar { found, offset }),
                None => Err(ParseError::MalformedToken { offset }),
            }
        }
        Err(_) => Err(ParseError::MalformedToken { offset: 0 }),
    }
}

fn is_space(c: char) -> bool {
    c <= ' '
}

fn is_ident_char(c: char) -> bool {
    c > ' ' && c != '=' && c != '"'
}

/// Parse every pair on the line
///
/// Pairs are separated by whitespace, except that a key may follow a closing
/// quote directly. Stops at the first token that is not a well-formed pair;
/// the caller reports whatever input remains.
fn parse_record(input: &str) -> IResult<&str, Vec<(&str, String)>> {
    let mut pairs = Vec::new();
    let mut input = input;
    let mut needs_separator = false;

    loop {
        let (after_space, space) = take_while(is_space)(input)?;
        if needs_separator && space.is_empty() {
            break;
        }
        match opt(parse_pair)(after_space)? {
            (rest, Some((pair, quoted))) => {
                pairs.push(pair);
                input = rest;
                needs_separator = !quoted;
            }
            (_, None) => break,
        }
    }

    let (input, _) = take_while(is_space)(input)?;
    Ok((input, pairs))
}

/// Parse one `key[=value]` token, reporting whether the value was quoted
fn parse_pair(input: &str) -> IResult<&str, ((&str, String), bool)> {
    let (input, key) = take_while1(is_ident_char)(input)?;
    let (input, value) = opt(preceded(char('='), parse_value))(input)?;

    let (value, quoted) = value.unwrap_or_default();
    Ok((input, ((key, value), quoted)))
}

fn parse_value(input: &str) -> IResult<&str, (String, bool)> {
    alt((
        map(parse_quoted, |value| (value, true)),
        map(take_while(is_ident_char), |value: &str| (value.to_string(), false)),
    ))(input)
}

/// Parse a double-quoted value, unescaping as it goes
fn parse_quoted(input: &str) -> IResult<&str, String> {
    delimited(
        char('"'),
        map(
            opt(escaped_transform(
                is_not("\\\""),
                '\\',
                alt((
                    value('"', char('"')),
                    value('\\', char('\\')),
                    value('/', char('/')),
                    value('\u{08}', char('b')),
                    value('\u{0C}', char('f')),
                    value('\n', char('n')),
                    value('\r', char('r')),
                    value('\t', char('t')),
                    parse_unicode_escape,
                )),
            )),
            Option::unwrap_or_default,
        ),
        char('"'),
    )(input)
}

/// Parse the `uXXXX` part of a `\uXXXX` escape
fn parse_unicode_escape(input: &str) -> IResult<&str, char> {
    preceded(
        char('u'),
        map(
            map_res(
                take_while_m_n(4, 4, |c: char| c.is_ascii_hexdigit()),
                |hex| u32::from_str_radix(hex, 16),
            ),
            |code| char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER),
        ),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> ParseResult<Fields> {
        LogfmtParser::new().parse(line)
    }

    fn json(line: &str) -> serde_json::Value {
        let fields = parse(line).unwrap();
        serde_json::from_str(&fields.to_json().unwrap()).unwrap()
    }

    #[test]
    fn test_basic_pairs() {
        let value = json(r#"level=info msg="hello world" latency=1.23"#);
        assert_eq!(value["level"], "info");
        assert_eq!(value["msg"], "hello world");
        assert_eq!(value["latency"], 1.23);
        assert!(value["latency"].is_f64());
    }

    #[test]
    fn test_integer_and_bool_coercion() {
        let value = json("status=200 ok=true size=512");
        assert_eq!(value["status"], 200);
        assert!(value["status"].is_i64());
        assert_eq!(value["ok"], true);
        assert_eq!(value["size"], 512);
        assert!(value["size"].is_i64());
    }

    #[test]
    fn test_false_coercion() {
        let value = json("error=false");
        assert_eq!(value["error"], false);
    }

    #[test]
    fn test_empty_value() {
        let fields = parse("key=").unwrap();
        assert_eq!(fields.get("key"), Some(&FieldValue::Str(String::new())));
    }

    #[test]
    fn test_bare_words_are_keys_with_empty_values() {
        let fields = parse("info started").unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("info"), Some(&FieldValue::Str(String::new())));
        assert_eq!(fields.get("started"), Some(&FieldValue::Str(String::new())));
    }

    #[test]
    fn test_empty_line_is_no_match() {
        assert_eq!(parse(""), Err(ParseError::Empty));
        assert_eq!(parse("   \t  "), Err(ParseError::Empty));
    }

    #[test]
    fn test_quoted_escapes() {
        let fields = parse(r#"msg="say \"hi\"\tnow" path="C:\\tmp" snow="\u2603""#).unwrap();
        assert_eq!(fields.get("msg"), Some(&FieldValue::from("say \"hi\"\tnow")));
        assert_eq!(fields.get("path"), Some(&FieldValue::from("C:\\tmp")));
        assert_eq!(fields.get("snow"), Some(&FieldValue::from("\u{2603}")));
    }

    #[test]
    fn test_empty_quoted_value() {
        let fields = parse(r#"msg="" next=1"#).unwrap();
        assert_eq!(fields.get("msg"), Some(&FieldValue::from("")));
        assert_eq!(fields.get("next"), Some(&FieldValue::Int(1)));
    }

    #[test]
    fn test_quoted_numbers_are_still_coerced() {
        let fields = parse(r#"count="42""#).unwrap();
        assert_eq!(fields.get("count"), Some(&FieldValue::Int(42)));
    }

    #[test]
    fn test_repeated_key_last_wins() {
        let fields = parse("a=1 a=2").unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("a"), Some(&FieldValue::Int(2)));
    }

    #[test]
    fn test_extra_whitespace_is_ignored() {
        let fields = parse("  a=1 \t b=two   ").unwrap();
        assert_eq!(fields.get("a"), Some(&FieldValue::Int(1)));
        assert_eq!(fields.get("b"), Some(&FieldValue::from("two")));
    }

    #[test]
    fn test_unicode_keys_and_values() {
        let fields = parse("città=Torino").unwrap();
        assert_eq!(fields.get("città"), Some(&FieldValue::from("Torino")));
    }

    #[test]
    fn test_unterminated_quote_is_rejected() {
        assert!(parse(r#"msg="never closed"#).is_err());
    }

    #[test]
    fn test_bad_escape_is_rejected() {
        assert!(parse(r#"msg="bad \x escape""#).is_err());
    }

    #[test]
    fn test_stray_equals_is_rejected() {
        assert_eq!(
            parse("a=b=c"),
            Err(ParseError::UnexpectedChar {
                found: '=',
                offset: 3
            })
        );
        assert!(parse("=value").is_err());
    }

    #[test]
    fn test_stray_quote_is_rejected() {
        assert!(parse(r#"a=b"c""#).is_err());
        assert!(parse(r#"a"b"=c"#).is_err());
    }

    #[test]
    fn test_key_may_follow_closing_quote() {
        let pairs = parse_pairs(r#"a="b"c"#).unwrap();
        assert_eq!(pairs, vec![("a", "b".to_string()), ("c", String::new())]);

        let pairs = parse_pairs(r#"msg="done"status=200 next=1"#).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("msg", "done".to_string()),
                ("status", "200".to_string()),
                ("next", "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_pairs_keeps_raw_values() {
        let pairs = parse_pairs(r#"n=007 s="x y""#).unwrap();
        assert_eq!(pairs, vec![("n", "007".to_string()), ("s", "x y".to_string())]);
    }
}
