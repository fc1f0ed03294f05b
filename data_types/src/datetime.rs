//! # DateTime Converter
//!
//! ISO 8601 timestamps, with or without a UTC offset. A trailing `Z` is read
//! as `+00:00`, fractional seconds are kept to the microsecond, and a bare
//! date reads as midnight. Values always render in full ISO 8601 form
//! (`2023-01-01T09:00:00`, `2023-01-01T09:00:00.250000+02:00`).

use crate::converter::{Converter, Slot, TypeTag};
use chrono::{DateTime as ChronoDateTime, FixedOffset, NaiveDate, NaiveDateTime, SubsecRound, Utc};
use errors::ConversionError;
use std::fmt;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M%:z"];

/// A timestamp that may or may not carry a UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateTimeValue {
    Naive(NaiveDateTime),
    Fixed(ChronoDateTime<FixedOffset>),
}

impl DateTimeValue {
    pub fn naive_local(&self) -> NaiveDateTime {
        match self {
            Self::Naive(naive) => *naive,
            Self::Fixed(fixed) => fixed.naive_local(),
        }
    }

    pub fn offset(&self) -> Option<FixedOffset> {
        match self {
            Self::Naive(_) => None,
            Self::Fixed(fixed) => Some(*fixed.offset()),
        }
    }

    fn truncated(self) -> Self {
        match self {
            Self::Naive(naive) => Self::Naive(naive.trunc_subsecs(6)),
            Self::Fixed(fixed) => Self::Fixed(fixed.trunc_subsecs(6)),
        }
    }
}

impl From<NaiveDateTime> for DateTimeValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::Naive(value).truncated()
    }
}

impl From<ChronoDateTime<FixedOffset>> for DateTimeValue {
    fn from(value: ChronoDateTime<FixedOffset>) -> Self {
        Self::Fixed(value).truncated()
    }
}

impl From<ChronoDateTime<Utc>> for DateTimeValue {
    fn from(value: ChronoDateTime<Utc>) -> Self {
        Self::Fixed(value.fixed_offset()).truncated()
    }
}

impl fmt::Display for DateTimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let naive = self.naive_local();
        write!(f, "{}", naive.format("%Y-%m-%dT%H:%M:%S"))?;

        let micros = naive.and_utc().timestamp_subsec_micros();
        if micros != 0 {
            write!(f, ".{micros:06}")?;
        }

        if let Self::Fixed(fixed) = self {
            write!(f, "{}", fixed.format("%:z"))?;
        }
        Ok(())
    }
}

/// Parse an ISO 8601 timestamp.
pub fn parse_iso(raw: &str) -> Result<DateTimeValue, ConversionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConversionError::EmptyInput { kind: "DateTime" });
    }

    let mut normalized = match trimmed.strip_suffix(['Z', 'z']) {
        Some(stripped) => format!("{stripped}+00:00"),
        None => trimmed.to_string(),
    };
    if normalized.get(10..11) == Some(" ") {
        normalized.replace_range(10..11, "T");
    }

    for format in OFFSET_FORMATS {
        if let Ok(fixed) = ChronoDateTime::parse_from_str(&normalized, format) {
            return Ok(fixed.into());
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Ok(naive.into());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).into());
    }

    Err(ConversionError::InvalidDateTime {
        input: raw.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateTime {
    slot: Slot<DateTimeValue>,
}

impl DateTime {
    pub fn new(default: impl Into<DateTimeValue>) -> Self {
        Self {
            slot: Slot::new(default.into()),
        }
    }
}

impl Converter for DateTime {
    type Value = DateTimeValue;

    fn declared_type(&self) -> TypeTag {
        TypeTag::DateTime
    }

    fn default_value(&self) -> &DateTimeValue {
        self.slot.default_value()
    }

    fn value(&self) -> &DateTimeValue {
        self.slot.value()
    }

    fn set_value(&mut self, value: DateTimeValue) {
        self.slot.set(value);
    }

    fn convert(&self, raw: &str) -> Result<DateTimeValue, ConversionError> {
        parse_iso(raw)
    }

    fn format(&self, value: &DateTimeValue) -> String {
        value.to_string()
    }
}
