//! Lenient serde helpers for server payloads.
//!
//! The game server stores money as SQL `NUMERIC`, so amounts may arrive as
//! JSON numbers or as decimal strings. Timestamps come either as RFC 3339 or
//! in the SQL text form (`2026-01-04 22:30:58.641961 +00:00`). Trade id lists
//! are sometimes wrapped by the database driver as `{"0": [...]}`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

/// A number-or-string amount before normalization.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Int(i64),
    Float(f64),
    Text(String),
}

fn normalize_amount(raw: RawAmount) -> Option<i64> {
    match raw {
        RawAmount::Int(v) => Some(v),
        RawAmount::Float(v) => round_to_i64(v),
        RawAmount::Text(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(round_to_i64))
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn round_to_i64(v: f64) -> Option<i64> {
    if !v.is_finite() || v.abs() >= 9.0e18 {
        return None;
    }
    Some(v.round() as i64)
}

/// Deserializes an amount given as a JSON number or decimal string.
///
/// Fractions are rounded to the nearest whole unit.
///
/// # Errors
///
/// Fails if the value is neither a number nor a numeric string.
pub fn amount<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = RawAmount::deserialize(deserializer)?;
    normalize_amount(raw).ok_or_else(|| serde::de::Error::custom("amount is not numeric"))
}

/// Like [`amount`], but a missing, `null` or non-numeric value yields `None`.
///
/// # Errors
///
/// Never fails on well-formed JSON.
pub fn opt_amount<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|v| serde_json::from_value::<RawAmount>(v).ok())
        .and_then(normalize_amount))
}

/// Parses a server timestamp.
///
/// Accepts RFC 3339 and the SQL text form with an optional offset. A value
/// without an offset is taken as UTC. Returns `None` if nothing matches.
#[must_use]
pub fn parse_server_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S%.f%:z",
        "%Y-%m-%d %H:%M:%S%.f %:z",
        "%Y-%m-%d %H:%M:%S%.f %z",
    ] {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Deserializes an optional timestamp with [`parse_server_date`].
///
/// Unparsable strings decode to `None` instead of failing the whole payload.
///
/// # Errors
///
/// Fails only if the value is neither a string nor `null`.
pub fn opt_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_server_date))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawIdList<T> {
    Plain(Vec<T>),
    Wrapped {
        #[serde(rename = "0")]
        inner: Vec<T>,
    },
}

/// Deserializes an id list given as `[...]`, `{"0": [...]}` or `null`.
///
/// # Errors
///
/// Fails if the value has some other shape or an element is invalid.
pub fn id_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let raw = Option::<RawIdList<T>>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawIdList::Plain(v) | RawIdList::Wrapped { inner: v }) => v,
        None => Vec::new(),
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[derive(Deserialize)]
    struct Money {
        #[serde(deserialize_with = "amount")]
        value: i64,
    }

    #[derive(Deserialize)]
    struct Ids {
        #[serde(default, deserialize_with = "id_list")]
        ids: Vec<u32>,
    }

    #[test]
    fn amount_accepts_number_and_string() {
        for (json, expected) in [
            (r#"{"value": 200}"#, 200),
            (r#"{"value": "200"}"#, 200),
            (r#"{"value": "150.00"}"#, 150),
            (r#"{"value": 99.6}"#, 100),
        ] {
            let Ok(m) = serde_json::from_str::<Money>(json) else {
                panic!("{json} should decode");
            };
            assert_eq!(m.value, expected, "{json}");
        }
    }

    #[test]
    fn amount_rejects_non_numeric_text() {
        assert!(serde_json::from_str::<Money>(r#"{"value": "lots"}"#).is_err());
    }

    #[test]
    fn sql_style_timestamp_parses() {
        let Some(dt) = parse_server_date("2026-01-04 22:30:58.641961 +00:00") else {
            panic!("sql timestamp should parse");
        };
        assert_eq!((dt.year(), dt.month(), dt.day()), (2026, 1, 4));
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (22, 30, 58));
    }

    #[test]
    fn offset_is_applied() {
        let Some(dt) = parse_server_date("2026-01-04 22:30:58 +02:00") else {
            panic!("offset timestamp should parse");
        };
        assert_eq!(dt.hour(), 20);
    }

    #[test]
    fn offset_without_space_parses() {
        let Some(dt) = parse_server_date("2026-01-04 22:30:58.5-03:00") else {
            panic!("attached offset should parse");
        };
        assert_eq!((dt.day(), dt.hour()), (5, 1));
    }

    #[test]
    fn missing_offset_means_utc() {
        let Some(dt) = parse_server_date("2026-01-04 10:00:00") else {
            panic!("naive timestamp should parse");
        };
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn rfc3339_parses_and_garbage_does_not() {
        assert!(parse_server_date("2026-01-04T22:30:58Z").is_some());
        assert!(parse_server_date("yesterday").is_none());
        assert!(parse_server_date("").is_none());
    }

    #[test]
    fn id_list_unwraps_driver_wrapper() {
        let Ok(plain) = serde_json::from_str::<Ids>(r#"{"ids": [1, 2]}"#) else {
            panic!("plain list should decode");
        };
        let Ok(wrapped) = serde_json::from_str::<Ids>(r#"{"ids": {"0": [1, 2]}}"#) else {
            panic!("wrapped list should decode");
        };
        let Ok(null) = serde_json::from_str::<Ids>(r#"{"ids": null}"#) else {
            panic!("null list should decode");
        };
        assert_eq!(plain.ids, vec![1, 2]);
        assert_eq!(wrapped.ids, vec![1, 2]);
        assert!(null.ids.is_empty());
    }
}
