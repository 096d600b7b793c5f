//! Duration strings like "30s", "1.5s", "1h30m", in both directions.

use serde::{self, Deserialize, Deserializer};
use std::time::Duration;

/// `deserialize_with` helper for duration fields in typed config sections.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_yaml::Value> = Option::deserialize(deserializer)?;
    match value {
        Some(serde_yaml::Value::String(s)) => parse_duration(&s).map_err(serde::de::Error::custom),
        Some(serde_yaml::Value::Number(n)) => n
            .as_f64()
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .ok_or_else(|| serde::de::Error::custom(format!("invalid duration: {}", n))),
        Some(serde_yaml::Value::Null) | None => Ok(Duration::ZERO),
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid duration: {:?}",
            other
        ))),
    }
}

/// Parse a sequence of `<number><unit>` segments. A bare number is seconds.
pub(crate) fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(Duration::ZERO);
    }

    let mut total = 0.0_f64;
    let mut rest = s;
    while !rest.is_empty() {
        // Find where the number ends and the unit begins
        let num_end = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(rest.len());
        let (num_str, tail) = rest.split_at(num_end);
        let num: f64 = num_str
            .parse()
            .map_err(|_| format!("invalid duration number: {}", num_str))?;

        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_end);

        let multiplier = match unit.trim() {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "" if num_end == rest.len() && total == 0.0 => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return Err(format!("unknown duration unit: {}", unit)),
        };

        total += num * multiplier;
        rest = next;
    }

    Duration::try_from_secs_f64(total).map_err(|e| format!("invalid duration {}: {}", s, e))
}

/// Render a duration the way humans write them: "1.5s", "250ms", "1h2m3s".
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }

    if nanos < 1_000 {
        return format!("{}ns", nanos);
    }
    if nanos < 1_000_000 {
        return format!("{}µs", trim_fraction(nanos, 1_000));
    }
    if nanos < 1_000_000_000 {
        return format!("{}ms", trim_fraction(nanos, 1_000_000));
    }

    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs_nanos = u128::from(total_secs % 60) * 1_000_000_000 + u128::from(d.subsec_nanos());

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    out.push_str(&format!("{}s", trim_fraction(secs_nanos, 1_000_000_000)));
    out
}

/// `value / unit` as a decimal string without trailing zeros.
fn trim_fraction(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let frac = value % unit;
    if frac == 0 {
        return whole.to_string();
    }

    let width = unit.to_string().len() - 1;
    let digits = format!("{:0width$}", frac, width = width);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}
