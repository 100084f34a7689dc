//! Consul duration strings
//!
//! Consul speaks Go's `time.Duration` text format on the wire (`"15s"`,
//! `"1m30s"`, `"500ms"`). Session lock delays come back as integer
//! nanoseconds instead, so both encodings live here.

use std::time::Duration;

/// Error returned when a duration string cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationError {
    #[error("empty duration string")]
    Empty,

    #[error("invalid duration '{0}'")]
    Invalid(String),

    #[error("unknown unit '{unit}' in duration '{input}'")]
    UnknownUnit { unit: String, input: String },
}

/// Format a duration the way Consul expects it in query parameters and
/// request bodies.
///
/// Whole seconds render as `"Ns"`, whole milliseconds as `"Nms"`, anything
/// finer falls back to nanoseconds.
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos % 1_000_000_000 == 0 {
        format!("{}s", d.as_secs())
    } else if nanos % 1_000_000 == 0 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{}ns", nanos)
    }
}

/// Parse a Go-style duration string such as `"10s"`, `"1m30s"` or `"1.5h"`.
///
/// A bare number is treated as seconds, matching how the Consul agent
/// interprets unit-less TTL values.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(DurationError::Empty);
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if let Ok(secs) = s.parse::<f64>() {
        return secs_to_duration(secs, input);
    }

    let mut total = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| DurationError::Invalid(input.to_string()))?;
        if num_len == 0 {
            return Err(DurationError::Invalid(input.to_string()));
        }
        let value: f64 = rest[..num_len]
            .parse()
            .map_err(|_| DurationError::Invalid(input.to_string()))?;
        rest = &rest[num_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];

        let nanos_per_unit = match unit {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => {
                return Err(DurationError::UnknownUnit {
                    unit: unit.to_string(),
                    input: input.to_string(),
                });
            }
        };
        total += value * nanos_per_unit;
    }

    if !total.is_finite() || total > u64::MAX as f64 {
        return Err(DurationError::Invalid(input.to_string()));
    }
    Ok(Duration::from_nanos(total.round() as u64))
}

fn secs_to_duration(secs: f64, input: &str) -> Result<Duration, DurationError> {
    if secs.is_sign_negative() {
        return Err(DurationError::Invalid(input.to_string()));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| DurationError::Invalid(input.to_string()))
}

/// Serde adapter for `Option<Duration>` fields encoded as Go duration strings
pub mod opt_duration_str {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => serializer.serialize_str(&super::format_duration(*d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<String> = Option::deserialize(deserializer)?;
        match opt.as_deref() {
            None | Some("") => Ok(None),
            Some(s) => super::parse_duration(s).map(Some).map_err(D::Error::custom),
        }
    }
}

/// Serde adapter for durations Consul reports as integer nanoseconds
/// (session `LockDelay`)
pub mod duration_nanos {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(value.as_nanos() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let nanos = Option::<u64>::deserialize(deserializer)?.unwrap_or_default();
        Ok(Duration::from_nanos(nanos))
    }
}
