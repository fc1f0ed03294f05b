//! # TimeDelta Converter
//!
//! Durations are read from two grammars and always written as a canonical
//! ISO 8601 duration.
//!
//! ## ISO 8601
//!
//! `P[n]Y[n]M[n]DT[n]H[n]M[n]S`, case-insensitive, every component optional
//! and every number may carry a decimal part. A year counts as 365 days and
//! a month as 30 days; this is an approximation, not calendar arithmetic.
//! A leading `-` negates the whole duration.
//!
//! ## Flexible
//!
//! Tried in order:
//! 1. `HH:MM:SS[.ffffff]`
//! 2. `MM:SS[.ffffff]`
//! 3. number/unit pairs such as `1h 30m` or `2 weeks`
//! 4. a bare number of seconds
//!
//! ## Output
//!
//! `[-]P[nD][T[nH][nM][nS]]` with zero components omitted and `PT0S` for the
//! zero duration. Seconds keep their fractional part to the microsecond.

use crate::converter::{Converter, Slot, TypeTag};
use chrono::TimeDelta as ChronoTimeDelta;
use errors::ConversionError;
use regex::{Captures, Regex};
use std::sync::LazyLock;

const MICROS_PER_SECOND: f64 = 1_000_000.0;
const SECONDS_PER_DAY: f64 = 86_400.0;
const DAYS_PER_YEAR: f64 = 365.0;
const DAYS_PER_MONTH: f64 = 30.0;

static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^P(?:(\d+(?:\.\d+)?)Y)?(?:(\d+(?:\.\d+)?)M)?(?:(\d+(?:\.\d+)?)D)?(?:T(?:(\d+(?:\.\d+)?)H)?(?:(\d+(?:\.\d+)?)M)?(?:(\d+(?:\.\d+)?)S)?)?$",
    )
    .expect("Failed to compile ISO duration regex")
});

static CLOCK_HMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+):(\d+):(\d+)(?:\.(\d+))?$").expect("Failed to compile h:m:s regex")
});

static CLOCK_MS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+):(\d+)(?:\.(\d+))?$").expect("Failed to compile m:s regex")
});

static UNIT_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*([a-z]+)").expect("Failed to compile duration unit regex")
});

/// Seconds per unit for the flexible grammar.
fn unit_seconds(unit: &str) -> Option<f64> {
    let seconds = match unit {
        "w" | "week" | "weeks" => 604_800.0,
        "d" | "day" | "days" => 86_400.0,
        "h" | "hour" | "hours" | "hr" | "hrs" => 3_600.0,
        "m" | "min" | "mins" | "minute" | "minutes" => 60.0,
        "s" | "sec" | "secs" | "second" | "seconds" => 1.0,
        _ => return None,
    };
    Some(seconds)
}

/// Parse either grammar.
pub fn parse_duration(raw: &str) -> Result<ChronoTimeDelta, ConversionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConversionError::EmptyInput { kind: "TimeDelta" });
    }

    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) if rest.starts_with(['P', 'p']) => (true, rest),
        _ => (false, trimmed),
    };

    if body.starts_with(['P', 'p']) {
        let seconds = parse_iso_seconds(body, raw)?;
        let signed = if negative { -seconds } else { seconds };
        return from_seconds(signed, raw);
    }

    from_seconds(parse_flexible_seconds(trimmed, raw)?, raw)
}

fn parse_iso_seconds(body: &str, raw: &str) -> Result<f64, ConversionError> {
    let upper = body.to_uppercase();
    let captures = ISO_DURATION.captures(&upper).ok_or_else(|| invalid(raw))?;

    let component = |index: usize| -> Result<f64, ConversionError> {
        captures
            .get(index)
            .map_or(Ok(0.0), |m| m.as_str().parse::<f64>().map_err(|_| invalid(raw)))
    };

    let days = component(1)? * DAYS_PER_YEAR + component(2)? * DAYS_PER_MONTH + component(3)?;
    let seconds = component(4)? * 3_600.0 + component(5)? * 60.0 + component(6)?;

    Ok(days * SECONDS_PER_DAY + seconds)
}

fn parse_flexible_seconds(trimmed: &str, raw: &str) -> Result<f64, ConversionError> {
    let lower = trimmed.to_lowercase();

    if let Some(captures) = CLOCK_HMS.captures(&lower) {
        let hours = whole(&captures[1], raw)?;
        let minutes = whole(&captures[2], raw)?;
        let seconds = whole(&captures[3], raw)?;
        let fraction = captures.get(4).map_or(Ok(0.0), |m| fraction(m.as_str(), raw))?;
        return Ok(hours * 3_600.0 + minutes * 60.0 + seconds + fraction);
    }

    if let Some(captures) = CLOCK_MS.captures(&lower) {
        let minutes = whole(&captures[1], raw)?;
        let seconds = whole(&captures[2], raw)?;
        let fraction = captures.get(3).map_or(Ok(0.0), |m| fraction(m.as_str(), raw))?;
        return Ok(minutes * 60.0 + seconds + fraction);
    }

    let pairs: Vec<Captures<'_>> = UNIT_PAIR.captures_iter(&lower).collect();
    if pairs.is_empty() {
        return lower
            .parse::<f64>()
            .ok()
            .filter(|seconds| seconds.is_finite())
            .ok_or_else(|| invalid(raw));
    }

    let mut total = 0.0;
    for pair in pairs {
        let unit = &pair[2];
        let per_unit = unit_seconds(unit).ok_or_else(|| ConversionError::UnknownTimeUnit {
            unit: unit.to_string(),
        })?;
        let amount = pair[1].parse::<f64>().map_err(|_| invalid(raw))?;
        total += amount * per_unit;
    }
    Ok(total)
}

fn whole(digits: &str, raw: &str) -> Result<f64, ConversionError> {
    digits.parse::<f64>().map_err(|_| invalid(raw))
}

fn fraction(digits: &str, raw: &str) -> Result<f64, ConversionError> {
    format!("0.{digits}").parse::<f64>().map_err(|_| invalid(raw))
}

fn invalid(raw: &str) -> ConversionError {
    ConversionError::InvalidDuration {
        input: raw.to_string(),
    }
}

/// Round to the microsecond.
fn from_seconds(seconds: f64, raw: &str) -> Result<ChronoTimeDelta, ConversionError> {
    let micros = (seconds * MICROS_PER_SECOND).round();
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return Err(invalid(raw));
    }
    #[allow(clippy::cast_possible_truncation)]
    Ok(ChronoTimeDelta::microseconds(micros as i64))
}

/// Canonical ISO 8601 form of `delta`.
pub fn format_iso(delta: &ChronoTimeDelta) -> String {
    let total_micros =
        i128::from(delta.num_seconds()) * 1_000_000 + i128::from(delta.subsec_nanos()) / 1_000;
    if total_micros == 0 {
        return "PT0S".to_string();
    }

    let sign = if total_micros < 0 { "-" } else { "" };
    let magnitude = total_micros.unsigned_abs();

    let micros = magnitude % 1_000_000;
    let total_seconds = magnitude / 1_000_000;
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    let mut out = format!("{sign}P");
    if days > 0 {
        out.push_str(&format!("{days}D"));
    }
    if hours > 0 || minutes > 0 || seconds > 0 || micros > 0 {
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{hours}H"));
        }
        if minutes > 0 {
            out.push_str(&format!("{minutes}M"));
        }
        if micros > 0 {
            let fraction = format!("{micros:06}");
            out.push_str(&format!("{seconds}.{}S", fraction.trim_end_matches('0')));
        } else if seconds > 0 {
            out.push_str(&format!("{seconds}S"));
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeDelta {
    slot: Slot<ChronoTimeDelta>,
}

impl TimeDelta {
    pub fn new(default: ChronoTimeDelta) -> Self {
        Self {
            slot: Slot::new(default),
        }
    }
}

impl Converter for TimeDelta {
    type Value = ChronoTimeDelta;

    fn declared_type(&self) -> TypeTag {
        TypeTag::Duration
    }

    fn default_value(&self) -> &ChronoTimeDelta {
        self.slot.default_value()
    }

    fn value(&self) -> &ChronoTimeDelta {
        self.slot.value()
    }

    fn set_value(&mut self, value: ChronoTimeDelta) {
        self.slot.set(value);
    }

    fn convert(&self, raw: &str) -> Result<ChronoTimeDelta, ConversionError> {
        parse_duration(raw)
    }

    fn format(&self, value: &ChronoTimeDelta) -> String {
        format_iso(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seconds(n: i64) -> ChronoTimeDelta {
        ChronoTimeDelta::seconds(n)
    }

    #[test]
    fn test_zero_is_pt0s() {
        assert_eq!(TimeDelta::new(ChronoTimeDelta::zero()).serialize(), "PT0S");
    }

    #[test]
    fn test_iso_components() {
        assert_eq!(parse_duration("PT1H30M").unwrap(), seconds(5_400));
        assert_eq!(parse_duration("P1DT2H").unwrap(), seconds(93_600));
        assert_eq!(parse_duration("pt45s").unwrap(), seconds(45));
        assert_eq!(parse_duration("PT1.5H").unwrap(), seconds(5_400));
        assert_eq!(parse_duration("P").unwrap(), ChronoTimeDelta::zero());
    }

    #[test]
    fn test_iso_years_and_months_are_approximate() {
        assert_eq!(parse_duration("P1Y").unwrap(), ChronoTimeDelta::days(365));
        assert_eq!(parse_duration("P2M").unwrap(), ChronoTimeDelta::days(60));
    }

    #[test]
    fn test_iso_rejects_garbage() {
        assert!(matches!(
            parse_duration("P1X"),
            Err(ConversionError::InvalidDuration { .. })
        ));
        assert!(parse_duration("PT1H30").is_err());
    }

    #[test]
    fn test_clock_forms() {
        assert_eq!(parse_duration("1:30:00").unwrap(), seconds(5_400));
        assert_eq!(parse_duration("02:30").unwrap(), seconds(150));
        assert_eq!(
            parse_duration("00:00:01.5").unwrap(),
            ChronoTimeDelta::milliseconds(1_500)
        );
    }

    #[test]
    fn test_unit_pairs() {
        assert_eq!(parse_duration("1h 30m").unwrap(), seconds(5_400));
        assert_eq!(parse_duration("90 minutes").unwrap(), seconds(5_400));
        assert_eq!(parse_duration("2 Weeks").unwrap(), ChronoTimeDelta::weeks(2));
        assert_eq!(parse_duration("1d2h").unwrap(), seconds(93_600));
    }

    #[test]
    fn test_unknown_unit() {
        assert_eq!(
            parse_duration("3 fortnights").unwrap_err(),
            ConversionError::UnknownTimeUnit {
                unit: "fortnights".to_string()
            }
        );
    }

    #[test]
    fn test_bare_seconds() {
        assert_eq!(parse_duration("90").unwrap(), seconds(90));
        assert_eq!(
            parse_duration("0.25").unwrap(),
            ChronoTimeDelta::milliseconds(250)
        );
        assert!(matches!(
            parse_duration("soon"),
            Err(ConversionError::InvalidDuration { .. })
        ));
        assert!(matches!(
            parse_duration("!!"),
            Err(ConversionError::InvalidDuration { .. })
        ));
        assert_eq!(
            parse_duration("").unwrap_err(),
            ConversionError::EmptyInput { kind: "TimeDelta" }
        );
    }

    #[test]
    fn test_format_omits_zero_components() {
        assert_eq!(format_iso(&seconds(5_400)), "PT1H30M");
        assert_eq!(format_iso(&ChronoTimeDelta::days(2)), "P2D");
        assert_eq!(format_iso(&seconds(93_601)), "P1DT2H1S");
        assert_eq!(
            format_iso(&ChronoTimeDelta::milliseconds(1_500)),
            "PT1.5S"
        );
        assert_eq!(
            format_iso(&ChronoTimeDelta::microseconds(1)),
            "PT0.000001S"
        );
    }

    #[test]
    fn test_negative_round_trip() {
        let delta = -seconds(5_400);
        let text = format_iso(&delta);
        assert_eq!(text, "-PT1H30M");
        assert_eq!(parse_duration(&text).unwrap(), delta);
    }
}
