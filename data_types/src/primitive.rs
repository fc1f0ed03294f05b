//! # Primitive Converters
//!
//! Boolean, integer (any base from 2 to 36), prefixed hexadecimal/octal/binary
//! integers, float, text and the null type.

use crate::converter::{Converter, Slot, TypeTag};
use errors::{ConversionError, InvalidDefaultError};

pub const DECIMAL: u32 = 10;
pub const HEXADECIMAL: u32 = 16;
pub const OCTAL: u32 = 8;
pub const BINARY: u32 = 2;

/// Tokens (case-insensitive, surrounding whitespace ignored) meaning "no value".
pub const NULL_TOKENS: [&str; 3] = ["none", "null", "nil"];

/// Whether `raw` is one of the recognized null tokens.
pub fn is_null_token(raw: &str) -> bool {
    let token = raw.trim().to_lowercase();
    NULL_TOKENS.contains(&token.as_str())
}

/// `true`/`1`/`yes` and `false`/`0`/`no`, case-insensitive.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Boolean {
    slot: Slot<bool>,
}

impl Boolean {
    pub fn new(default: bool) -> Self {
        Self {
            slot: Slot::new(default),
        }
    }
}

impl Converter for Boolean {
    type Value = bool;

    fn declared_type(&self) -> TypeTag {
        TypeTag::Bool
    }

    fn default_value(&self) -> &bool {
        self.slot.default_value()
    }

    fn value(&self) -> &bool {
        self.slot.value()
    }

    fn set_value(&mut self, value: bool) {
        self.slot.set(value);
    }

    fn convert(&self, raw: &str) -> Result<bool, ConversionError> {
        match raw.to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConversionError::InvalidBoolean {
                input: raw.to_string(),
            }),
        }
    }

    fn format(&self, value: &bool) -> String {
        value.to_string()
    }
}

/// Integer stored in a configurable base.
///
/// Base 10 values are stored bare. Other bases are stored tagged as
/// `<base>c<digits>`, e.g. `2c101` for five in base 2.
#[derive(Debug, Clone, PartialEq)]
pub struct Integer {
    slot: Slot<i64>,
    base: u32,
}

impl Default for Integer {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Integer {
    pub fn new(default: i64) -> Self {
        Self {
            slot: Slot::new(default),
            base: DECIMAL,
        }
    }

    pub fn with_base(default: i64, base: u32) -> Result<Self, InvalidDefaultError> {
        if !(2..=36).contains(&base) {
            return Err(InvalidDefaultError::UnsupportedBase { base });
        }
        Ok(Self {
            slot: Slot::new(default),
            base,
        })
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    /// Splits `"16cff"` into `(16, "ff")` when the text before the first `c`
    /// is a base number.
    fn split_tagged(raw: &str) -> Option<(u32, &str)> {
        let (prefix, digits) = raw.split_once('c')?;
        if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        prefix.parse().ok().map(|base| (base, digits))
    }
}

impl Converter for Integer {
    type Value = i64;

    fn declared_type(&self) -> TypeTag {
        TypeTag::Int
    }

    fn default_value(&self) -> &i64 {
        self.slot.default_value()
    }

    fn value(&self) -> &i64 {
        self.slot.value()
    }

    fn set_value(&mut self, value: i64) {
        self.slot.set(value);
    }

    fn convert(&self, raw: &str) -> Result<i64, ConversionError> {
        let trimmed = raw.trim();
        match Self::split_tagged(trimmed) {
            Some((base, digits)) if base == self.base => parse_radix(digits, self.base, raw),
            Some((base, _)) => {
                // `c` is itself a digit from base 13 upwards, so `12c4` may be
                // a plain hexadecimal literal rather than a tagged value.
                if self.base > 12 {
                    if let Ok(value) = parse_radix(trimmed, self.base, raw) {
                        return Ok(value);
                    }
                }
                Err(ConversionError::BaseMismatch {
                    input: raw.to_string(),
                    expected: self.base,
                    found: base,
                })
            }
            None => parse_radix(trimmed, self.base, raw),
        }
    }

    fn format(&self, value: &i64) -> String {
        if self.base == DECIMAL {
            value.to_string()
        } else {
            format!("{}c{}", self.base, to_radix(*value, self.base))
        }
    }
}

/// Integer with a fixed base, stored with a `0x`/`0o`/`0b` prefix.
///
/// The prefix is optional on input. Negative values are stored as `-0x2a`;
/// `0x-2a` is accepted as well.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefixedInteger<const BASE: u32> {
    slot: Slot<i64>,
}

pub type Hex = PrefixedInteger<HEXADECIMAL>;
pub type Octal = PrefixedInteger<OCTAL>;
pub type Binary = PrefixedInteger<BINARY>;

impl<const BASE: u32> PrefixedInteger<BASE> {
    const PREFIX: &'static str = match BASE {
        HEXADECIMAL => "0x",
        OCTAL => "0o",
        BINARY => "0b",
        _ => "",
    };

    pub fn new(default: i64) -> Self {
        Self {
            slot: Slot::new(default),
        }
    }

    pub fn prefix(&self) -> &'static str {
        Self::PREFIX
    }

    fn strip_prefix(raw: &str) -> &str {
        let prefix = Self::PREFIX;
        match raw.get(..prefix.len()) {
            Some(head) if !prefix.is_empty() && head.eq_ignore_ascii_case(prefix) => {
                &raw[prefix.len()..]
            }
            _ => raw,
        }
    }
}

impl Binary {
    /// Big-endian unsigned interpretation of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, InvalidDefaultError> {
        let mut value: i64 = 0;
        for byte in bytes {
            value = value
                .checked_mul(256)
                .and_then(|v| v.checked_add(i64::from(*byte)))
                .ok_or_else(|| InvalidDefaultError::Malformed {
                    default: format!("{bytes:?}"),
                    reason: "value does not fit in a 64-bit signed integer".to_string(),
                })?;
        }
        Ok(Self::new(value))
    }
}

impl<const BASE: u32> Converter for PrefixedInteger<BASE> {
    type Value = i64;

    fn declared_type(&self) -> TypeTag {
        TypeTag::Int
    }

    fn default_value(&self) -> &i64 {
        self.slot.default_value()
    }

    fn value(&self) -> &i64 {
        self.slot.value()
    }

    fn set_value(&mut self, value: i64) {
        self.slot.set(value);
    }

    fn convert(&self, raw: &str) -> Result<i64, ConversionError> {
        let trimmed = raw.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let digits = Self::strip_prefix(unsigned);
        let digits = if negative {
            format!("-{digits}")
        } else {
            digits.to_string()
        };
        parse_radix(&digits, BASE, raw)
    }

    fn format(&self, value: &i64) -> String {
        let sign = if *value < 0 { "-" } else { "" };
        let digits = to_radix(*value, BASE);
        format!("{sign}{}{}", Self::PREFIX, digits.trim_start_matches('-'))
    }
}

/// Standard float parsing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Float {
    slot: Slot<f64>,
}

impl Float {
    pub fn new(default: f64) -> Self {
        Self {
            slot: Slot::new(default),
        }
    }
}

impl Converter for Float {
    type Value = f64;

    fn declared_type(&self) -> TypeTag {
        TypeTag::Float
    }

    fn default_value(&self) -> &f64 {
        self.slot.default_value()
    }

    fn value(&self) -> &f64 {
        self.slot.value()
    }

    fn set_value(&mut self, value: f64) {
        self.slot.set(value);
    }

    fn convert(&self, raw: &str) -> Result<f64, ConversionError> {
        raw.trim()
            .parse::<f64>()
            .map_err(|e| ConversionError::InvalidFloat {
                input: raw.to_string(),
                reason: e.to_string(),
            })
    }

    fn format(&self, value: &f64) -> String {
        // Debug keeps the fractional part of whole numbers (`30.0`).
        format!("{value:?}")
    }
}

/// Identity conversion. The empty string is a valid default.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Text {
    slot: Slot<String>,
}

impl Text {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            slot: Slot::new(default.into()),
        }
    }
}

impl Converter for Text {
    type Value = String;

    fn declared_type(&self) -> TypeTag {
        TypeTag::Str
    }

    fn default_value(&self) -> &String {
        self.slot.default_value()
    }

    fn value(&self) -> &String {
        self.slot.value()
    }

    fn set_value(&mut self, value: String) {
        self.slot.set(value);
    }

    fn convert(&self, raw: &str) -> Result<String, ConversionError> {
        Ok(raw.to_string())
    }

    fn format(&self, value: &String) -> String {
        value.clone()
    }
}

/// The null type: its only value is `()`, stored as `None`.
///
/// `convert` succeeds only for a null token. Use [`is_null_token`] when a
/// yes/no answer is wanted instead of a value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoneType {
    slot: Slot<()>,
}

impl NoneType {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Converter for NoneType {
    type Value = ();

    fn declared_type(&self) -> TypeTag {
        TypeTag::None
    }

    fn default_value(&self) -> &() {
        self.slot.default_value()
    }

    fn value(&self) -> &() {
        self.slot.value()
    }

    fn set_value(&mut self, value: ()) {
        self.slot.set(value);
    }

    fn convert(&self, raw: &str) -> Result<(), ConversionError> {
        if is_null_token(raw) {
            Ok(())
        } else {
            Err(ConversionError::NotNull {
                input: raw.to_string(),
            })
        }
    }

    fn format(&self, _value: &()) -> String {
        "None".to_string()
    }
}

fn parse_radix(digits: &str, base: u32, input: &str) -> Result<i64, ConversionError> {
    i64::from_str_radix(digits, base).map_err(|e| ConversionError::InvalidInteger {
        input: input.to_string(),
        base,
        reason: e.to_string(),
    })
}

/// Lowercase digits of `value` in `base`, with a leading `-` when negative.
fn to_radix(value: i64, base: u32) -> String {
    let mut magnitude = value.unsigned_abs();
    if magnitude == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while magnitude > 0 {
        let digit = (magnitude % u64::from(base)) as u32;
        digits.push(std::char::from_digit(digit, base).unwrap_or('?'));
        magnitude /= u64::from(base);
    }
    if value < 0 {
        digits.push('-');
    }
    digits.iter().rev().collect()
}
