//! # Enum Family
//!
//! Four converters over user enumerations. The enumeration type is a type
//! parameter, so lookups always resolve against the same type as the
//! default value.
//!
//! - [`Enum`]: by member name (`AsRef<str>`, e.g. strum `AsRefStr`), any
//!   qualifying prefix before the last `.` is ignored
//! - [`StrEnum`]: by string value (`FromStr`/`Display`, e.g. strum
//!   `EnumString`/`Display`)
//! - [`IntEnum`]: by integer value ([`IntValued`])
//! - [`IntFlag`]: by integer bit set ([`FlagBits`])

use crate::converter::{Converter, Slot, TypeTag, short_type_name};
use errors::ConversionError;
use std::fmt::{Debug, Display};
use std::str::FromStr;
use strum::IntoEnumIterator;

/// Enumeration backed by integer values.
pub trait IntValued: Sized {
    fn to_int(&self) -> i64;

    fn from_int(value: i64) -> Option<Self>;
}

/// Combination of integer flags.
pub trait FlagBits: Sized {
    fn bits(&self) -> i64;

    /// `None` when `bits` contains a flag the type does not define.
    fn from_bits(bits: i64) -> Option<Self>;
}

/// Bounds shared by every enum converter value.
pub trait EnumValue: Clone + Debug + PartialEq + Send + 'static {}

impl<T: Clone + Debug + PartialEq + Send + 'static> EnumValue for T {}

fn unknown_member<E>(input: &str) -> ConversionError {
    ConversionError::UnknownEnumMember {
        type_name: short_type_name::<E>().to_string(),
        input: input.to_string(),
    }
}

fn parse_int(raw: &str) -> Result<i64, ConversionError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|e| ConversionError::InvalidInteger {
            input: raw.to_string(),
            base: 10,
            reason: e.to_string(),
        })
}

macro_rules! enum_slot_accessors {
    ($value:ty) => {
        fn default_value(&self) -> &$value {
            self.slot.default_value()
        }

        fn value(&self) -> &$value {
            self.slot.value()
        }

        fn set_value(&mut self, value: $value) {
            self.slot.set(value);
        }

        fn declared_type(&self) -> TypeTag {
            TypeTag::Enum(short_type_name::<$value>())
        }
    };
}

/// Enum looked up by member name.
#[derive(Debug)]
pub struct Enum<E> {
    slot: Slot<E>,
}

impl<E: EnumValue> Enum<E> {
    pub fn new(default: E) -> Self {
        Self {
            slot: Slot::new(default),
        }
    }
}

impl<E> Converter for Enum<E>
where
    E: EnumValue + IntoEnumIterator + AsRef<str>,
{
    type Value = E;

    enum_slot_accessors!(E);

    fn convert(&self, raw: &str) -> Result<E, ConversionError> {
        let name = raw.rsplit('.').next().unwrap_or(raw);
        E::iter()
            .find(|member| member.as_ref() == name)
            .ok_or_else(|| unknown_member::<E>(raw))
    }

    fn format(&self, value: &E) -> String {
        value.as_ref().to_string()
    }
}

/// Enum looked up by string value.
#[derive(Debug)]
pub struct StrEnum<E> {
    slot: Slot<E>,
}

impl<E: EnumValue> StrEnum<E> {
    pub fn new(default: E) -> Self {
        Self {
            slot: Slot::new(default),
        }
    }
}

impl<E> Converter for StrEnum<E>
where
    E: EnumValue + FromStr + Display,
{
    type Value = E;

    enum_slot_accessors!(E);

    fn convert(&self, raw: &str) -> Result<E, ConversionError> {
        E::from_str(raw).map_err(|_| unknown_member::<E>(raw))
    }

    fn format(&self, value: &E) -> String {
        value.to_string()
    }
}

/// Enum looked up by integer value.
#[derive(Debug)]
pub struct IntEnum<E> {
    slot: Slot<E>,
}

impl<E: EnumValue + IntValued> IntEnum<E> {
    pub fn new(default: E) -> Self {
        Self {
            slot: Slot::new(default),
        }
    }
}

impl<E> Converter for IntEnum<E>
where
    E: EnumValue + IntValued,
{
    type Value = E;

    enum_slot_accessors!(E);

    fn convert(&self, raw: &str) -> Result<E, ConversionError> {
        let value = parse_int(raw)?;
        E::from_int(value).ok_or_else(|| unknown_member::<E>(raw))
    }

    fn format(&self, value: &E) -> String {
        value.to_int().to_string()
    }
}

/// Flag combination looked up by integer bits.
#[derive(Debug)]
pub struct IntFlag<F> {
    slot: Slot<F>,
}

impl<F: EnumValue + FlagBits> IntFlag<F> {
    pub fn new(default: F) -> Self {
        Self {
            slot: Slot::new(default),
        }
    }
}

impl<F> Converter for IntFlag<F>
where
    F: EnumValue + FlagBits,
{
    type Value = F;

    enum_slot_accessors!(F);

    fn convert(&self, raw: &str) -> Result<F, ConversionError> {
        let bits = parse_int(raw)?;
        F::from_bits(bits).ok_or_else(|| unknown_member::<F>(raw))
    }

    fn format(&self, value: &F) -> String {
        value.bits().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::{AsRefStr, Display as StrumDisplay, EnumIter, EnumString};

    #[derive(Debug, Clone, Copy, PartialEq, EnumIter, AsRefStr)]
    enum Color {
        Red,
        Green,
    }

    #[derive(Debug, Clone, Copy, PartialEq, EnumString, StrumDisplay)]
    enum LogLevel {
        #[strum(serialize = "DEBUG")]
        Debug,
        #[strum(serialize = "INFO")]
        Info,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Priority {
        Low = 1,
        High = 5,
    }

    impl IntValued for Priority {
        fn to_int(&self) -> i64 {
            *self as i64
        }

        fn from_int(value: i64) -> Option<Self> {
            match value {
                1 => Some(Self::Low),
                5 => Some(Self::High),
                _ => None,
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Permissions(i64);

    impl Permissions {
        const READ: i64 = 1;
        const WRITE: i64 = 2;
        const EXECUTE: i64 = 4;
    }

    impl FlagBits for Permissions {
        fn bits(&self) -> i64 {
            self.0
        }

        fn from_bits(bits: i64) -> Option<Self> {
            let all = Self::READ | Self::WRITE | Self::EXECUTE;
            (bits & !all == 0).then_some(Self(bits))
        }
    }

    #[test]
    fn test_enum_by_name() {
        let converter = Enum::new(Color::Red);
        assert_eq!(converter.serialize(), "Red");
        assert_eq!(converter.convert("Green").unwrap(), Color::Green);
        assert_eq!(converter.convert("Color.Green").unwrap(), Color::Green);
        assert_eq!(converter.declared_type(), TypeTag::Enum("Color"));
    }

    #[test]
    fn test_enum_unknown_member() {
        let err = Enum::new(Color::Red).convert("Blue").unwrap_err();
        assert_eq!(
            err,
            ConversionError::UnknownEnumMember {
                type_name: "Color".to_string(),
                input: "Blue".to_string(),
            }
        );
    }

    #[test]
    fn test_str_enum_by_value() {
        let converter = StrEnum::new(LogLevel::Info);
        assert_eq!(converter.serialize(), "INFO");
        assert_eq!(converter.convert("DEBUG").unwrap(), LogLevel::Debug);
        assert!(converter.convert("Debug").is_err());
    }

    #[test]
    fn test_int_enum() {
        let converter = IntEnum::new(Priority::Low);
        assert_eq!(converter.serialize(), "1");
        assert_eq!(converter.convert("5").unwrap(), Priority::High);
        assert!(matches!(
            converter.convert("3"),
            Err(ConversionError::UnknownEnumMember { .. })
        ));
        assert!(matches!(
            converter.convert("high"),
            Err(ConversionError::InvalidInteger { .. })
        ));
    }

    #[test]
    fn test_int_flag() {
        let converter = IntFlag::new(Permissions(Permissions::READ));
        assert_eq!(converter.serialize(), "1");
        assert_eq!(
            converter.convert("3").unwrap(),
            Permissions(Permissions::READ | Permissions::WRITE)
        );
        assert!(converter.convert("8").is_err());
        assert!(converter.validate().is_ok());
    }
}
