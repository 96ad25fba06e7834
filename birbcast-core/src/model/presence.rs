use crate::error::PayloadError;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct RawPresence {
    count: Value,
}

/// Parses a presence frame `{"count": n}`.
pub fn parse_presence_count(text: &str) -> Result<u64, PayloadError> {
    let raw: RawPresence = serde_json::from_str(text)?;
    coerce_count(&raw.count)
}

/// Coerces a json value into a viewer count.
///
/// Integers, integral floats and numeric strings are accepted; negative or
/// non-numeric values are rejected.
pub fn coerce_count(value: &Value) -> Result<u64, PayloadError> {
    match value {
        Value::Number(n) => {
            if let Some(count) = n.as_u64() {
                return Ok(count);
            }
            match n.as_f64() {
                Some(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 => Ok(f as u64),
                _ => Err(PayloadError::Count(n.to_string())),
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| PayloadError::Count(s.clone())),
        other => Err(PayloadError::Count(other.to_string())),
    }
}
