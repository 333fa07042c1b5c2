//! Per-cell coercion. Every function here is total: a value that cannot be
//! coerced comes back as `None` (or a sentinel for phones) and the caller
//! substitutes the typed default.

use serde_json::Value;

use crate::constants::PHONE_INVALID;

/// Non-negative whole number from a loosely typed cell.
/// Floats are truncated toward zero; negatives, NaN and non-numeric text
/// are rejected.
pub fn count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Some(u)
            } else if n.is_i64() {
                None
            } else {
                n.as_f64().and_then(truncate_non_negative)
            }
        }
        Value::String(s) => parse_count(s.trim()),
        _ => None,
    }
}

fn parse_count(text: &str) -> Option<u64> {
    if text.is_empty() {
        return None;
    }
    if let Ok(u) = text.parse::<u64>() {
        return Some(u);
    }
    text.parse::<f64>().ok().and_then(truncate_non_negative)
}

fn truncate_non_negative(f: f64) -> Option<u64> {
    if !f.is_finite() || f < 0.0 || f >= u64::MAX as f64 {
        return None;
    }
    Some(f.trunc() as u64)
}

/// `count` narrowed to `u32`; out-of-range values are rejected
pub fn small_count(value: &Value) -> Option<u32> {
    count(value).and_then(|n| u32::try_from(n).ok())
}

/// Signed whole number, used for ids
pub fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(truncate_signed)),
        Value::String(s) => {
            let text = s.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(truncate_signed))
        }
        _ => None,
    }
}

fn truncate_signed(f: f64) -> Option<i64> {
    if !f.is_finite() || f <= i64::MIN as f64 || f >= i64::MAX as f64 {
        return None;
    }
    Some(f.trunc() as i64)
}

/// Text form of a cell. Null has no text form.
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Canonical phone form: the digit string rendered as an integer, or
/// `Invalid Number` when the value carries a lowercase `x` extension marker,
/// has no digits, or is null.
pub fn phone(value: &Value) -> String {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match (n.as_u64(), n.as_i64(), n.as_f64()) {
            (Some(u), _, _) => u.to_string(),
            (None, Some(i), _) => i.to_string(),
            (None, None, Some(f)) if f.is_finite() && f.fract() == 0.0 => format!("{:.0}", f),
            _ => n.to_string(),
        },
        _ => return PHONE_INVALID.to_string(),
    };

    if raw.contains('x') {
        return PHONE_INVALID.to_string();
    }

    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return PHONE_INVALID.to_string();
    }

    // Integer rendering drops leading zeros
    match digits.trim_start_matches('0') {
        "" => "0".to_string(),
        significant => significant.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_count_accepts_numbers_and_numeric_text() {
        assert_eq!(count(&json!(7)), Some(7));
        assert_eq!(count(&json!(7.9)), Some(7));
        assert_eq!(count(&json!("12")), Some(12));
        assert_eq!(count(&json!(" 4.5 ")), Some(4));
        assert_eq!(count(&json!("1e3")), Some(1000));
    }

    #[test]
    fn test_count_rejects_garbage() {
        assert_eq!(count(&json!("unknown")), None);
        assert_eq!(count(&json!("")), None);
        assert_eq!(count(&json!(-3)), None);
        assert_eq!(count(&json!("-3")), None);
        assert_eq!(count(&json!("NaN")), None);
        assert_eq!(count(&json!(true)), None);
        assert_eq!(count(&Value::Null), None);
        assert_eq!(count(&json!([1])), None);
    }

    #[test]
    fn test_small_count_rejects_overflow() {
        assert_eq!(small_count(&json!(4_294_967_296u64)), None);
        assert_eq!(small_count(&json!(42)), Some(42));
    }

    #[test]
    fn test_integer() {
        assert_eq!(integer(&json!(3)), Some(3));
        assert_eq!(integer(&json!(-3)), Some(-3));
        assert_eq!(integer(&json!(3.0)), Some(3));
        assert_eq!(integer(&json!("17")), Some(17));
        assert_eq!(integer(&json!("17.0")), Some(17));
        assert_eq!(integer(&json!("abc")), None);
        assert_eq!(integer(&Value::Null), None);
    }

    #[test]
    fn test_text_preserves_values_verbatim() {
        assert_eq!(text(&json!("  Padded  ")), Some("  Padded  ".to_string()));
        assert_eq!(text(&json!(42)), Some("42".to_string()));
        assert_eq!(text(&json!(false)), Some("false".to_string()));
        assert_eq!(text(&Value::Null), None);
    }

    #[test]
    fn test_phone_extension_is_invalid() {
        assert_eq!(phone(&json!("+1-971-533-4552x1542")), PHONE_INVALID);
    }

    #[test]
    fn test_phone_uppercase_x_is_not_an_extension() {
        assert_eq!(phone(&json!("555-0100 X12")), "555010012");
    }

    #[test]
    fn test_phone_strips_non_digits() {
        assert_eq!(phone(&json!("555-1234")), "5551234");
        assert_eq!(phone(&json!("(206) 555-0100")), "2065550100");
        assert_eq!(phone(&json!("+1.206.555.0100")), "12065550100");
    }

    #[test]
    fn test_phone_numeric_input() {
        assert_eq!(phone(&json!(5551234)), "5551234");
        assert_eq!(phone(&json!(5551234.0)), "5551234");
    }

    #[test]
    fn test_phone_without_digits_is_invalid() {
        assert_eq!(phone(&json!("n/a")), PHONE_INVALID);
        assert_eq!(phone(&json!("")), PHONE_INVALID);
        assert_eq!(phone(&Value::Null), PHONE_INVALID);
        assert_eq!(phone(&json!(true)), PHONE_INVALID);
    }

    #[test]
    fn test_phone_drops_leading_zeros() {
        assert_eq!(phone(&json!("0044 20 7946 0000")), "442079460000");
        assert_eq!(phone(&json!("000")), "0");
    }
}
