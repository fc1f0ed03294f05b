//! # Data Types
//!
//! Typed converters between the strings kept in a configuration file and the
//! values a program works with.
//!
//! This crate provides:
//! - Primitive converters (boolean, integers in any base, float, string, null)
//! - Composite converters (list, optional, the enum family)
//! - Extended formats (URL, ISO 8601 datetime and duration)
//! - Declared type tags and validation against them
//! - Static (`IntoConverter`) and dynamic (`ConverterRegistry`) selection

pub mod converter;
pub mod datetime;
pub mod duration;
pub mod enums;
pub mod factory;
pub mod list;
pub mod optional;
pub mod primitive;
pub mod registry;
pub mod urls;

pub use converter::{Converter, Slot, TypeTag};
pub use datetime::{DateTime, DateTimeValue};
pub use duration::TimeDelta;
pub use enums::{Enum, FlagBits, IntEnum, IntFlag, IntValued, StrEnum};
pub use factory::IntoConverter;
pub use list::List;
pub use optional::Optional;
pub use primitive::{
    BINARY, Binary, Boolean, DECIMAL, Float, HEXADECIMAL, Hex, Integer, NULL_TOKENS, NoneType,
    OCTAL, Octal, PrefixedInteger, Text, is_null_token,
};
pub use registry::{ConverterRegistry, DynamicValue, ErasedConverter, ErasedOptional, Value};
pub use urls::Url;

#[cfg(test)]
mod proptests;
