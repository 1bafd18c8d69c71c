//! Duration values as written in configuration files.
//!
//! A duration is either an integer number of seconds or a string of
//! `<number><unit>` groups such as `90m`, `1h30m` or `7d`.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Parse a duration string.
///
/// Supported units: `s`, `m`, `h`, `d`, `w`, `M` (30 days), `y` (365 days).
/// A string holding only digits is read as seconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("duration must not be empty".into());
    }
    if let Ok(secs) = trimmed.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total: u64 = 0;
    let mut digits = String::new();
    for ch in trimmed.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let unit = match ch {
            's' => 1,
            'm' => MINUTE,
            'h' => HOUR,
            'd' => DAY,
            'w' => 7 * DAY,
            'M' => 30 * DAY,
            'y' => 365 * DAY,
            other => return Err(format!("invalid duration '{input}': unknown unit '{other}'")),
        };
        if digits.is_empty() {
            return Err(format!("invalid duration '{input}': unit '{ch}' has no value"));
        }
        let value: u64 = digits
            .parse()
            .map_err(|_| format!("invalid duration '{input}': value out of range"))?;
        digits.clear();
        total = value
            .checked_mul(unit)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(|| format!("invalid duration '{input}': value out of range"))?;
    }
    if !digits.is_empty() {
        return Err(format!("invalid duration '{input}': '{digits}' has no unit"));
    }
    Ok(Duration::from_secs(total))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Seconds(u64),
    Text(String),
}

/// Serde helper for `Option<Duration>` fields: absent or `null` stays `None`.
pub(crate) fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawDuration>::deserialize(deserializer)?;
    raw.map(|value| match value {
        RawDuration::Seconds(secs) => Ok(Duration::from_secs(secs)),
        RawDuration::Text(text) => parse_duration(&text),
    })
    .transpose()
    .map_err(serde::de::Error::custom)
}
