//! Literal rendering
//!
//! Strings are double-quoted with `\`, `"`, and control characters escaped.
//! Pattern literals for `LIKE` carry a second escape layer for the wildcard
//! characters `*` and `?`.

use esql_ir::Value;
use esql_registry::LikeKind;

use crate::error::TranslateError;

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Double-quoted, escaped string literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

pub fn float(f: f64) -> Result<String, TranslateError> {
    if !f.is_finite() {
        return Err(TranslateError::unsupported(format!(
            "non-finite numeric literal {}",
            f
        )));
    }
    let s = f.to_string();
    if s.contains(['.', 'e', 'E']) {
        Ok(s)
    } else {
        Ok(format!("{}.0", s))
    }
}

/// Render a typed value in literal syntax.
pub fn literal(value: &Value) -> Result<String, TranslateError> {
    match value {
        Value::Null => Ok("null".to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => float(*f),
        Value::String(s) => Ok(quote(s)),
        Value::DateTime(dt) => Ok(quote(&dt.format(DATETIME_FORMAT).to_string())),
        Value::Duration(ms) => Ok(duration(*ms)),
        // Enums are stored under their symbolic name
        Value::Enum(e) => Ok(quote(&e.name)),
        Value::List(items) => {
            let items = items.iter().map(literal).collect::<Result<Vec<_>, _>>()?;
            Ok(format!("[{}]", items.join(", ")))
        }
    }
}

const DURATION_UNITS: &[(i64, &str)] = &[
    (7 * 24 * 60 * 60 * 1000, "week"),
    (24 * 60 * 60 * 1000, "day"),
    (60 * 60 * 1000, "hour"),
    (60 * 1000, "minute"),
    (1000, "second"),
];

/// Time span in the largest unit that divides it exactly.
pub fn duration(millis: i64) -> String {
    for (size, unit) in DURATION_UNITS {
        if millis != 0 && millis % size == 0 {
            return interval(millis / size, unit);
        }
    }
    interval(millis, "millisecond")
}

/// `<n> <unit>`, singular for one.
pub fn interval(n: i64, unit: &str) -> String {
    let singular = unit.strip_suffix('s').unwrap_or(unit);
    if n == 1 || n == -1 {
        format!("{} {}", n, singular)
    } else {
        format!("{} {}s", n, singular)
    }
}

/// Escape the `LIKE` wildcards so `text` matches literally.
pub fn escape_pattern(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '?') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Quoted `LIKE` pattern for a contains/starts-with/ends-with test.
pub fn like_pattern(kind: LikeKind, text: &str) -> String {
    let escaped = escape_pattern(text);
    let pattern = match kind {
        LikeKind::Contains => format!("*{}*", escaped),
        LikeKind::StartsWith => format!("{}*", escaped),
        LikeKind::EndsWith => format!("*{}", escaped),
    };
    quote(&pattern)
}

/// JSON form of a parameter value for the request body.
pub fn parameter_json(value: &Value) -> serde_json::Value {
    use serde_json::Value as Json;

    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Value::String(s) => Json::String(s.clone()),
        Value::DateTime(dt) => Json::String(dt.format(DATETIME_FORMAT).to_string()),
        Value::Duration(ms) => Json::String(duration(*ms)),
        Value::Enum(e) => Json::String(e.name.clone()),
        Value::List(items) => Json::Array(items.iter().map(parameter_json).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use esql_ir::EnumValue;

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("plain"), r#""plain""#);
        assert_eq!(quote(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(quote(r"C:\logs"), r#""C:\\logs""#);
        assert_eq!(quote("a\nb\tc"), r#""a\nb\tc""#);
    }

    #[test]
    fn test_literals() {
        assert_eq!(literal(&Value::Null).unwrap(), "null");
        assert_eq!(literal(&Value::Bool(true)).unwrap(), "true");
        assert_eq!(literal(&Value::Int(-42)).unwrap(), "-42");
        assert_eq!(literal(&Value::Float(3.0)).unwrap(), "3.0");
        assert_eq!(literal(&Value::Float(0.25)).unwrap(), "0.25");
        assert!(literal(&Value::Float(f64::NAN)).is_err());

        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(
            literal(&Value::DateTime(dt)).unwrap(),
            r#""2024-03-01T12:30:00.000Z""#
        );

        let level = Value::Enum(EnumValue {
            type_name: "LogLevel".to_string(),
            name: "Error".to_string(),
            ordinal: 3,
        });
        assert_eq!(literal(&level).unwrap(), r#""Error""#);

        let list = Value::from(vec![1, 2]);
        assert_eq!(literal(&list).unwrap(), "[1, 2]");
    }

    #[test]
    fn test_duration_uses_largest_exact_unit() {
        assert_eq!(duration(60 * 60 * 1000), "1 hour");
        assert_eq!(duration(90 * 1000), "90 seconds");
        assert_eq!(duration(14 * 24 * 60 * 60 * 1000), "2 weeks");
        assert_eq!(duration(1500), "1500 milliseconds");
        assert_eq!(duration(0), "0 milliseconds");
        assert_eq!(interval(5, "minutes"), "5 minutes");
        assert_eq!(interval(1, "days"), "1 day");
    }

    #[test]
    fn test_like_pattern_escaping() {
        assert_eq!(like_pattern(LikeKind::Contains, "error"), r#""*error*""#);
        assert_eq!(like_pattern(LikeKind::StartsWith, "GET"), r#""GET*""#);
        assert_eq!(like_pattern(LikeKind::EndsWith, ".log"), r#""*.log""#);
        // wildcard escape then string escape
        assert_eq!(like_pattern(LikeKind::Contains, "a*b"), r#""*a\\*b*""#);
        assert_eq!(like_pattern(LikeKind::Contains, r#"q"?"#), r#""*q\"\\?*""#);
    }

    #[test]
    fn test_parameter_json() {
        assert_eq!(parameter_json(&Value::Int(5)), serde_json::json!(5));
        assert_eq!(parameter_json(&Value::from("x")), serde_json::json!("x"));
        assert_eq!(
            parameter_json(&Value::from(vec!["a", "b"])),
            serde_json::json!(["a", "b"])
        );
        assert_eq!(parameter_json(&Value::Float(f64::INFINITY)), serde_json::Value::Null);
    }
}
