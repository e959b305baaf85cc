//! Lenient coercion of upstream scalars.
//!
//! Alpha Vantage encodes almost every number as a string and uses `"None"` or
//! `"-"` for missing figures. These helpers accept strings, numbers and nulls
//! and fall back to zero (or an empty string) instead of failing.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parses a numeric string, stripping a trailing `%`. Unparseable or
/// non-finite input yields `0.0`.
pub(crate) fn parse_number(s: &str) -> f64 {
    try_parse_number(s).unwrap_or(0.0)
}

fn try_parse_number(s: &str) -> Option<f64> {
    s.trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Reads a finite `f64` out of a JSON scalar, or `None` if there is none.
pub(crate) fn try_number_from(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => try_parse_number(s),
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Coerces a JSON scalar into a finite `f64`.
pub(crate) fn number_from(value: &Value) -> f64 {
    try_number_from(value).unwrap_or(0.0)
}

/// Coerces a JSON scalar into a non-negative integer count.
pub(crate) fn count_from(value: &Value) -> u64 {
    if let Some(n) = value.as_u64() {
        return n;
    }
    if let Some(n) = value.as_str().and_then(|s| s.trim().parse::<u64>().ok()) {
        return n;
    }
    let n = number_from(value);
    if n > 0.0 { n as u64 } else { 0 }
}

/// Coerces a JSON scalar into a string.
pub(crate) fn text_from(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub(crate) fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(number_from(&Value::deserialize(d)?))
}

pub(crate) fn count<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    Ok(count_from(&Value::deserialize(d)?))
}

pub(crate) fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(text_from(&Value::deserialize(d)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("189.84"), 189.84);
        assert_eq!(parse_number(" -1.2345% "), -1.2345);
        assert_eq!(parse_number("None"), 0.0);
        assert_eq!(parse_number("-"), 0.0);
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("NaN"), 0.0);
        assert_eq!(parse_number("inf"), 0.0);
    }

    #[test]
    fn test_coercion_from_json() {
        assert_eq!(number_from(&json!(1.5)), 1.5);
        assert_eq!(number_from(&json!(null)), 0.0);
        assert_eq!(number_from(&json!({"x": 1})), 0.0);
        assert_eq!(try_number_from(&json!("None")), None);
        assert_eq!(try_number_from(&json!(null)), None);
        assert_eq!(try_number_from(&json!("0")), Some(0.0));
        assert_eq!(count_from(&json!("48436800")), 48_436_800);
        assert_eq!(count_from(&json!("1.2e3")), 1_200);
        assert_eq!(count_from(&json!("-5")), 0);
        assert_eq!(text_from(&json!(12)), "12");
        assert_eq!(text_from(&json!(null)), "");
    }
}
