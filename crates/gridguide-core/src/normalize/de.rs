//! Lenient field decoders.
//!
//! Provider payloads mix strings, numbers and nulls for the same field
//! across responses, so these helpers accept any JSON scalar and map the
//! unusable ones to `None`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::model::SeriesNumber;

/// String or number as a non-empty string.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Non-negative integer given as a number or a numeric string.
pub(crate) fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Season or episode number; a string keeps its zero padding.
pub(crate) fn lenient_series_number<'de, D>(
    deserializer: D,
) -> Result<Option<SeriesNumber>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(SeriesNumber::new),
        Some(Value::String(s)) => SeriesNumber::parse(&s),
        _ => None,
    })
}

/// Signed integer given as a number or a numeric string.
pub(crate) fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Boolean given as `true`, a non-zero number, `"true"` or `"1"`.
pub(crate) fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => Some(n.as_i64() != Some(0)),
        Some(Value::String(s)) => Some(s.eq_ignore_ascii_case("true") || s == "1"),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "lenient_string")]
        text: Option<String>,
        #[serde(default, deserialize_with = "lenient_u32")]
        count: Option<u32>,
        #[serde(default, deserialize_with = "lenient_bool")]
        flag: Option<bool>,
        #[serde(default, deserialize_with = "lenient_series_number")]
        season: Option<SeriesNumber>,
    }

    #[test]
    fn test_accepts_numbers_and_strings() {
        // Arrange
        let json = r#"{"text": 2019, "count": "12", "flag": 1}"#;

        // Act
        let sample: Sample = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(sample.text.as_deref(), Some("2019"));
        assert_eq!(sample.count, Some(12));
        assert_eq!(sample.flag, Some(true));
    }

    #[test]
    fn test_series_number_width_from_string_only() {
        // Arrange
        let padded = r#"{"season": "003"}"#;
        let numeric = r#"{"season": 3}"#;

        // Act
        let from_string: Sample = serde_json::from_str(padded).unwrap();
        let from_number: Sample = serde_json::from_str(numeric).unwrap();

        // Assert
        assert_eq!(from_string.season.unwrap().digits, 3);
        assert_eq!(from_number.season.unwrap().digits, 1);
        assert_eq!(from_number.season.unwrap().value, 3);
    }

    #[test]
    fn test_null_and_empty_become_none() {
        // Arrange
        let json = r#"{"text": "", "count": null}"#;

        // Act
        let sample: Sample = serde_json::from_str(json).unwrap();

        // Assert
        assert!(sample.text.is_none());
        assert!(sample.count.is_none());
        assert!(sample.flag.is_none());
    }
}
