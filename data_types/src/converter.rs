//! # Converter Contract
//!
//! A converter pairs a default value and a live value of one semantic type
//! and maps between that value and its canonical string form.
//!
//! The type a converter produces is declared up front as a [`TypeTag`]
//! instead of being discovered from the value, and [`Converter::validate`]
//! checks the live value against that declaration.

use errors::{ConversionError, InvalidConverterError};
use std::fmt;

/// Declared semantic type of a converter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Bool,
    Int,
    Float,
    Str,
    None,
    DateTime,
    Duration,
    /// An enumeration, identified by its type name.
    Enum(&'static str),
    /// An ordered sequence. Only the origin (`list`) takes part in validation.
    List(Box<TypeTag>),
    /// The inner type or `None`.
    Optional(Box<TypeTag>),
    /// A user-defined composite type.
    Custom(&'static str),
}

impl TypeTag {
    pub fn list_of(element: TypeTag) -> Self {
        Self::List(Box::new(element))
    }

    pub fn optional(inner: TypeTag) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Whether a value of type `actual` satisfies this declared type.
    pub fn admits(&self, actual: &TypeTag) -> bool {
        match (self, actual) {
            (Self::Optional(_), Self::None) => true,
            (Self::Optional(inner), other) => inner.admits(other),
            (Self::List(_), Self::List(_)) => true,
            (expected, actual) => expected == actual,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::Str => f.write_str("str"),
            Self::None => f.write_str("None"),
            Self::DateTime => f.write_str("datetime"),
            Self::Duration => f.write_str("timedelta"),
            Self::Enum(name) | Self::Custom(name) => f.write_str(name),
            Self::List(element) => write!(f, "list[{element}]"),
            Self::Optional(inner) => write!(f, "{inner} | None"),
        }
    }
}

/// Maps between a stored string and a typed in-memory value.
///
/// `convert` is a pure function of its input. `format` renders any value of
/// the converter's type; `serialize` renders the live value and is the exact
/// string persisted in the backing store.
pub trait Converter: fmt::Debug + Send {
    type Value: Clone + fmt::Debug + PartialEq + Send;

    /// Type fixed at construction time.
    fn declared_type(&self) -> TypeTag;

    fn default_value(&self) -> &Self::Value;

    fn value(&self) -> &Self::Value;

    fn set_value(&mut self, value: Self::Value);

    fn convert(&self, raw: &str) -> Result<Self::Value, ConversionError>;

    fn format(&self, value: &Self::Value) -> String;

    /// Runtime type of `value`. Converters whose values can take several
    /// shapes (optional, list) report the shape actually held.
    fn type_of(&self, _value: &Self::Value) -> TypeTag {
        self.declared_type()
    }

    fn serialize(&self) -> String {
        self.format(self.value())
    }

    /// Check the live value against the declared type.
    fn validate(&self) -> Result<(), InvalidConverterError> {
        let expected = self.declared_type();
        let found = self.type_of(self.value());
        if expected.admits(&found) {
            Ok(())
        } else {
            Err(InvalidConverterError::TypeMismatch {
                expected: expected.to_string(),
                found: found.to_string(),
            })
        }
    }
}

/// Default and live value of a converter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Slot<T> {
    default: T,
    value: T,
}

impl<T: Clone> Slot<T> {
    pub fn new(default: T) -> Self {
        Self {
            value: default.clone(),
            default,
        }
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn set(&mut self, value: T) {
        self.value = value;
    }
}

/// Last path segment of a type name, e.g. `Color` for `app::config::Color`.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
