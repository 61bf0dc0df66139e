//! Tolerant field decoders for data written by the embedded player or older builds.
//!
//! The player's JSON is not under our control, so a missing or oddly typed display
//! field must not cost the whole record. Identity fields stay strict.

use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub(crate) fn as_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

pub(crate) fn as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A number or numeric string; anything else, `null` included, reads as `0.0`.
pub fn number_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(as_f64(&Value::deserialize(deserializer)?).unwrap_or(0.0))
}

/// The field's default when the value has the wrong shape.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Epoch milliseconds, as a number or numeric string.
pub fn millis_option<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(as_f64(&value).and_then(|ms| Utc.timestamp_millis_opt(ms as i64).single()))
}

/// Like [`millis_option`], with the Unix epoch standing in for unreadable values.
pub fn millis_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    Ok(millis_option(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_coercion() {
        assert_eq!(as_f64(&json!(12.5)), Some(12.5));
        assert_eq!(as_f64(&json!(" 30 ")), Some(30.0));
        assert_eq!(as_f64(&json!(null)), None);
        assert_eq!(as_f64(&json!("NaN")), None);
        assert_eq!(as_u32(&json!("3")), Some(3));
        assert_eq!(as_u32(&json!(-1)), None);
        assert_eq!(as_u32(&json!(true)), None);
    }
}
