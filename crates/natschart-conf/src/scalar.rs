//! Classification of unquoted scalar tokens

use serde_json::{Number, Value};

/// Integer size suffixes, longest first so `kb` wins over `k`.
const SIZE_SUFFIXES: &[(&str, i64)] = &[
    ("kb", 1 << 10),
    ("mb", 1 << 20),
    ("gb", 1 << 30),
    ("tb", 1 << 40),
    ("k", 1_000),
    ("m", 1_000_000),
    ("g", 1_000_000_000),
    ("t", 1_000_000_000_000),
];

/// Outcome of classifying a bare token
#[derive(Debug, PartialEq)]
pub(crate) enum Scalar {
    /// Decoded value
    Value(Value),
    /// Looked numeric but does not fit in an i64
    Overflow,
}

/// Decode an unquoted token into a boolean, number, or plain string.
pub(crate) fn classify(token: &str) -> Scalar {
    if let Some(b) = parse_bool(token) {
        return Scalar::Value(Value::Bool(b));
    }
    if let Some(int) = parse_integer(token) {
        return match int {
            Some(i) => Scalar::Value(Value::Number(i.into())),
            None => Scalar::Overflow,
        };
    }
    if let Some(f) = parse_float(token) {
        // NaN/inf never reach here; the float grammar only admits digits
        if let Some(n) = Number::from_f64(f) {
            return Scalar::Value(Value::Number(n));
        }
    }
    Scalar::Value(Value::String(token.to_string()))
}

fn parse_bool(token: &str) -> Option<bool> {
    match token.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Some(true),
        "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Returns `None` when the token is not integer-shaped, `Some(None)` on overflow.
fn parse_integer(token: &str) -> Option<Option<i64>> {
    let (negative, body) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let digits_end = body
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(body.len());
    if digits_end == 0 {
        return None;
    }
    let (digits, suffix) = body.split_at(digits_end);
    let multiplier = if suffix.is_empty() {
        1
    } else {
        let lower = suffix.to_ascii_lowercase();
        SIZE_SUFFIXES
            .iter()
            .find(|(s, _)| *s == lower)
            .map(|(_, m)| *m)?
    };

    let parsed = digits
        .parse::<i64>()
        .ok()
        .and_then(|v| v.checked_mul(multiplier))
        .map(|v| if negative { -v } else { v });
    Some(parsed)
}

fn parse_float(token: &str) -> Option<f64> {
    let body = token.strip_prefix('-').unwrap_or(token);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(idx) => (&body[..idx], Some(&body[idx + 1..])),
        None => (body, None),
    };
    let (whole, frac) = mantissa.split_once('.')?;
    if whole.is_empty()
        || frac.is_empty()
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !frac.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }
    if let Some(exp) = exponent {
        let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
        if exp.is_empty() || !exp.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
    }
    token.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn value(token: &str) -> Value {
        match classify(token) {
            Scalar::Value(v) => v,
            Scalar::Overflow => panic!("unexpected overflow for {token}"),
        }
    }

    #[test]
    fn booleans_accept_all_spellings() {
        for t in ["true", "TRUE", "yes", "On"] {
            assert_eq!(value(t), json!(true), "{t}");
        }
        for t in ["false", "no", "OFF"] {
            assert_eq!(value(t), json!(false), "{t}");
        }
    }

    #[test]
    fn integers_and_size_suffixes() {
        assert_eq!(value("4222"), json!(4222));
        assert_eq!(value("-5"), json!(-5));
        assert_eq!(value("1k"), json!(1000));
        assert_eq!(value("1KB"), json!(1024));
        assert_eq!(value("8mb"), json!(8 * 1024 * 1024));
        assert_eq!(value("2G"), json!(2_000_000_000i64));
    }

    #[test]
    fn unknown_suffix_is_a_string() {
        assert_eq!(value("30s"), json!("30s"));
        assert_eq!(value("2m30s"), json!("2m30s"));
    }

    #[test]
    fn floats_require_a_fraction() {
        assert_eq!(value("1.5"), json!(1.5));
        assert_eq!(value("-0.25"), json!(-0.25));
        assert_eq!(value("2.0e3"), json!(2000.0));
        assert_eq!(value("1."), json!("1."));
    }

    #[test]
    fn addresses_stay_strings() {
        assert_eq!(value("10.0.0.1"), json!("10.0.0.1"));
        assert_eq!(value("0.0.0.0"), json!("0.0.0.0"));
        assert_eq!(value("nats-0"), json!("nats-0"));
    }

    #[test]
    fn overflow_is_reported() {
        assert_eq!(classify("99999999999999999999"), Scalar::Overflow);
        assert_eq!(classify("9999999999999tb"), Scalar::Overflow);
    }
}
