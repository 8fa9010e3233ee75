//! Turns wire text into [`Sample`]s.
//!
//! Grammar (anchored, no trailing whitespace):
//! `^([A-Za-z0-9._\-]+):(-?[0-9.]+)\|([a-z]+)(?:\|@([0-9.]+))?$`

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::sample::{Kind, Sample, Value};

static LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9._\-]+):(-?[0-9.]+)\|([a-z]+)(?:\|@([0-9.]+))?$")
        .expect("static line regex is valid")
});

/// A line that failed to parse. Carries the rejected text so the caller can
/// log exactly what was dropped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("rejected line: {line:?}")]
pub struct ParseError {
    pub line: String,
}

fn kind_for_token(token: &str) -> Option<Kind> {
    match token {
        "c" => Some(Kind::Counter),
        "ms" => Some(Kind::Timer),
        "kv" => Some(Kind::KeyValue),
        _ => None,
    }
}

/// Parses one numeric token, rejecting anything the regex's character class
/// accepts but which isn't actually a number: `-`, `.`, or more than one `.`.
fn parse_number(token: &str) -> Option<Value> {
    let dots = token.bytes().filter(|&b| b == b'.').count();
    if dots > 1 {
        return None;
    }
    if dots == 1 {
        token.parse::<f64>().ok().map(Value::Float)
    } else {
        token.parse::<i64>().ok().map(Value::Int)
    }
}

/// Parses one line into a [`Sample`].
///
/// A blank line is not an error here — callers that split a multi-line
/// batch should skip blank lines themselves before calling this (see
/// [`parse_batch`]), since a lone blank line has no useful `ParseError` to
/// report.
pub fn parse(line: &str) -> Result<Sample, ParseError> {
    let reject = || ParseError {
        line: line.to_string(),
    };

    let caps = LINE.captures(line).ok_or_else(reject)?;
    let key = &caps[1];
    let value = parse_number(&caps[2]).ok_or_else(reject)?;
    let kind = kind_for_token(&caps[3]).ok_or_else(reject)?;
    let flag = match caps.get(4) {
        Some(m) => Some(parse_number(m.as_str()).ok_or_else(reject)?),
        None => None,
    };

    Ok(Sample::new(key, value, kind, flag))
}

/// Splits `blob` on `\n` (a bare `\r` is not a delimiter) and parses every
/// non-blank line. Invalid lines are logged and dropped; they never abort
/// the rest of the batch.
pub fn parse_batch(blob: &str) -> Vec<Sample> {
    blob.split('\n')
        .filter(|line| !line.is_empty())
        .filter_map(|line| match parse(line) {
            Ok(sample) => Some(sample),
            Err(err) => {
                tracing::warn!("dropping unparsable line: {err}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_counter_with_rate() {
        let s = parse("page.views:2|c|@0.5").unwrap();
        assert_eq!(s.key, "page.views");
        assert_eq!(s.value, Value::Int(2));
        assert_eq!(s.kind, Kind::Counter);
        assert_eq!(s.flag, Some(Value::Float(0.5)));
    }

    #[test]
    fn parses_kv_with_explicit_timestamp() {
        let s = parse("answer:42|kv|@123456").unwrap();
        assert_eq!(s.value, Value::Int(42));
        assert_eq!(s.kind, Kind::KeyValue);
        assert_eq!(s.flag, Some(Value::Int(123456)));
    }

    #[test]
    fn parses_kv_without_flag() {
        let s = parse("answer:42|kv").unwrap();
        assert_eq!(s.flag, None);
    }

    #[test]
    fn parses_timer_float_value() {
        let s = parse("t:12.5|ms").unwrap();
        assert_eq!(s.value, Value::Float(12.5));
        assert_eq!(s.kind, Kind::Timer);
    }

    #[test]
    fn parses_negative_value() {
        let s = parse("delta:-5|c").unwrap();
        assert_eq!(s.value, Value::Int(-5));
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!(parse("junk:1|zz").is_err());
    }

    #[test]
    fn rejects_bare_dot_value() {
        assert!(parse("bad:.|c").is_err());
    }

    #[test]
    fn rejects_multi_dot_value() {
        assert!(parse("bad:1.2.3|c").is_err());
    }

    #[test]
    fn rejects_trailing_whitespace() {
        assert!(parse("page.views:2|c ").is_err());
    }

    #[test]
    fn batch_skips_blank_lines_and_keeps_valid_ones() {
        let samples = parse_batch("a:1|c\n\nb:2|c\njunk:1|zz\n");
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].key, "a");
        assert_eq!(samples[1].key, "b");
    }

    #[test]
    fn batch_treats_bare_cr_as_part_of_key_not_a_delimiter() {
        // A bare \r is not a line delimiter; a line ending in \r fails the
        // grammar (no trailing whitespace allowed) and is dropped, but it
        // must not be treated as two lines.
        let samples = parse_batch("a:1|c\r\nb:2|c");
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].key, "b");
    }
}
