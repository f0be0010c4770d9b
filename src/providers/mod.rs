//! Per-provider response parsing.
//!
//! One submodule per consumed provider. Each validates the response shape
//! once at the boundary and hands typed records to the rest of the scan;
//! beyond the boundary no code touches raw provider JSON.
//!
//! Providers disagree on field names and representation (numbers as strings,
//! booleans as `1`/`"true"`), so the shared coercion helpers here normalize
//! values tolerantly instead of failing a whole record on one odd field.

pub mod abuse;
pub mod dnsbl;
pub mod ip_fraud;
pub mod reputation;
pub mod whois;

use serde_json::Value;

/// Returns the first of `keys` present in `value` as a non-empty string.
///
/// Strings pass through; numbers are stringified. Empty strings count as
/// absent so a provider's `""` does not shadow a later alias.
pub(crate) fn first_string(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match value.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => continue,
        }
    }
    None
}

/// Coerces a value to a non-negative integer, defaulting to 0.
///
/// Accepts numbers and numeric strings; anything else (missing, null,
/// booleans, garbage text) collapses to 0.
pub(crate) fn number_or_zero(value: Option<&Value>) -> u32 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64))
            .unwrap_or(0) as u32,
        Some(Value::String(s)) => s.trim().parse::<f64>().map(|f| f.max(0.0) as u32).unwrap_or(0),
        _ => 0,
    }
}

/// Coerces a value to a boolean.
///
/// True for `true`, any nonzero number, and any non-empty string other than
/// `"false"` and `"0"` (case-insensitive). Everything else is false.
pub(crate) fn bool_coerce(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => {
            let s = s.trim();
            !s.is_empty() && !s.eq_ignore_ascii_case("false") && s != "0"
        }
        _ => false,
    }
}
