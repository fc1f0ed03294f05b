//! # Converter Registry
//!
//! Runtime counterpart of [`IntoConverter`](crate::IntoConverter): converters
//! are looked up by type name and built from a dynamically typed [`Value`].
//!
//! The type name is always chosen explicitly. A `None` default never selects
//! a converter on its own; [`ConverterRegistry::build_optional`] names the
//! inner type instead.

use crate::converter::{Converter, TypeTag};
use crate::datetime::{DateTime, DateTimeValue};
use crate::duration::TimeDelta;
use crate::primitive::{Binary, Boolean, Float, Hex, Integer, Octal, Text, is_null_token};
use crate::urls::Url;
use errors::{ConversionError, InvalidConverterError, InvalidDefaultError};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// A dynamically typed configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    None,
    DateTime(DateTimeValue),
    Duration(chrono::TimeDelta),
    List(Vec<Value>),
}

impl Value {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Self::Bool(_) => TypeTag::Bool,
            Self::Int(_) => TypeTag::Int,
            Self::Float(_) => TypeTag::Float,
            Self::Str(_) => TypeTag::Str,
            Self::None => TypeTag::None,
            Self::DateTime(_) => TypeTag::DateTime,
            Self::Duration(_) => TypeTag::Duration,
            Self::List(items) => {
                TypeTag::list_of(items.first().map_or(TypeTag::None, Value::type_tag))
            }
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::None => "None",
            Self::DateTime(_) => "datetime",
            Self::Duration(_) => "timedelta",
            Self::List(_) => "list",
        }
    }
}

/// Conversion between a converter's value type and [`Value`].
pub trait DynamicValue: Sized {
    fn into_dynamic(self) -> Value;

    fn from_dynamic(value: Value) -> Option<Self>;
}

macro_rules! dynamic_scalar {
    ($ty:ty, $variant:ident) => {
        impl DynamicValue for $ty {
            fn into_dynamic(self) -> Value {
                Value::$variant(self)
            }

            fn from_dynamic(value: Value) -> Option<Self> {
                match value {
                    Value::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

dynamic_scalar!(bool, Bool);
dynamic_scalar!(i64, Int);
dynamic_scalar!(f64, Float);
dynamic_scalar!(String, Str);
dynamic_scalar!(DateTimeValue, DateTime);
dynamic_scalar!(chrono::TimeDelta, Duration);

impl DynamicValue for () {
    fn into_dynamic(self) -> Value {
        Value::None
    }

    fn from_dynamic(value: Value) -> Option<Self> {
        matches!(value, Value::None).then_some(())
    }
}

impl<T: DynamicValue> DynamicValue for Vec<T> {
    fn into_dynamic(self) -> Value {
        Value::List(self.into_iter().map(DynamicValue::into_dynamic).collect())
    }

    fn from_dynamic(value: Value) -> Option<Self> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_dynamic).collect(),
            _ => None,
        }
    }
}

impl<T: DynamicValue> DynamicValue for Option<T> {
    fn into_dynamic(self) -> Value {
        self.map_or(Value::None, DynamicValue::into_dynamic)
    }

    fn from_dynamic(value: Value) -> Option<Self> {
        match value {
            Value::None => Some(None),
            other => T::from_dynamic(other).map(Some),
        }
    }
}

/// Object-safe view over a converter.
pub trait ErasedConverter: fmt::Debug + Send {
    fn declared_type(&self) -> TypeTag;

    fn default_value(&self) -> Value;

    fn value(&self) -> Value;

    fn convert_value(&self, raw: &str) -> Result<Value, ConversionError>;

    /// Fails when `value` does not fit the declared type.
    fn set_value(&mut self, value: Value) -> Result<(), InvalidConverterError>;

    fn serialize(&self) -> String;

    fn validate(&self) -> Result<(), InvalidConverterError>;
}

fn mismatch(expected: &TypeTag, value: &Value) -> InvalidConverterError {
    InvalidConverterError::TypeMismatch {
        expected: expected.to_string(),
        found: value.type_tag().to_string(),
    }
}

impl<C> ErasedConverter for C
where
    C: Converter,
    C::Value: DynamicValue,
{
    fn declared_type(&self) -> TypeTag {
        Converter::declared_type(self)
    }

    fn default_value(&self) -> Value {
        Converter::default_value(self).clone().into_dynamic()
    }

    fn value(&self) -> Value {
        Converter::value(self).clone().into_dynamic()
    }

    fn convert_value(&self, raw: &str) -> Result<Value, ConversionError> {
        self.convert(raw).map(DynamicValue::into_dynamic)
    }

    fn set_value(&mut self, value: Value) -> Result<(), InvalidConverterError> {
        let expected = Converter::declared_type(self);
        let typed = C::Value::from_dynamic(value.clone()).ok_or_else(|| mismatch(&expected, &value))?;
        Converter::set_value(self, typed);
        Ok(())
    }

    fn serialize(&self) -> String {
        Converter::serialize(self)
    }

    fn validate(&self) -> Result<(), InvalidConverterError> {
        Converter::validate(self)
    }
}

/// Optional wrapper over an erased converter.
#[derive(Debug)]
pub struct ErasedOptional {
    inner: Box<dyn ErasedConverter>,
    default: Value,
    value: Value,
}

impl ErasedOptional {
    /// Default taken from the inner converter.
    pub fn new(inner: Box<dyn ErasedConverter>) -> Self {
        let default = inner.default_value();
        let value = inner.value();
        Self {
            inner,
            default,
            value,
        }
    }

    /// Absent by default.
    pub fn absent(inner: Box<dyn ErasedConverter>) -> Self {
        Self {
            inner,
            default: Value::None,
            value: Value::None,
        }
    }
}

impl ErasedConverter for ErasedOptional {
    fn declared_type(&self) -> TypeTag {
        TypeTag::optional(self.inner.declared_type())
    }

    fn default_value(&self) -> Value {
        self.default.clone()
    }

    fn value(&self) -> Value {
        self.value.clone()
    }

    fn convert_value(&self, raw: &str) -> Result<Value, ConversionError> {
        if is_null_token(raw) {
            return Ok(Value::None);
        }
        self.inner.convert_value(raw)
    }

    fn set_value(&mut self, value: Value) -> Result<(), InvalidConverterError> {
        if value != Value::None {
            self.inner.set_value(value.clone())?;
        }
        self.value = value;
        Ok(())
    }

    fn serialize(&self) -> String {
        match self.value {
            Value::None => "None".to_string(),
            _ => self.inner.serialize(),
        }
    }

    fn validate(&self) -> Result<(), InvalidConverterError> {
        match self.value {
            Value::None => Ok(()),
            _ => self.inner.validate(),
        }
    }
}

pub type Constructor =
    Box<dyn Fn(Value) -> Result<Box<dyn ErasedConverter>, InvalidDefaultError> + Send + Sync>;

/// Typed default out of a dynamic one. `None` is never accepted here.
pub fn typed_default<T: DynamicValue>(
    value: Value,
    expected: &'static str,
) -> Result<T, InvalidDefaultError> {
    if value == Value::None {
        return Err(InvalidDefaultError::UntypedNone);
    }
    let found = value.type_name().to_string();
    T::from_dynamic(value).ok_or(InvalidDefaultError::WrongType { expected, found })
}

fn boxed<C>(converter: C) -> Box<dyn ErasedConverter>
where
    C: Converter + 'static,
    C::Value: DynamicValue,
{
    Box::new(converter)
}

/// Type name to converter constructor.
pub struct ConverterRegistry {
    constructors: BTreeMap<String, Constructor>,
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("names", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterRegistry {
    /// Registry with the built-in converters.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("bool", |v| Ok(boxed(Boolean::new(typed_default(v, "bool")?))));
        registry.register("int", |v| Ok(boxed(Integer::new(typed_default(v, "int")?))));
        registry.register("float", |v| Ok(boxed(Float::new(typed_default(v, "float")?))));
        registry.register("str", |v| {
            Ok(boxed(Text::new(typed_default::<String>(v, "str")?)))
        });
        registry.register("hex", |v| Ok(boxed(Hex::new(typed_default(v, "int")?))));
        registry.register("octal", |v| Ok(boxed(Octal::new(typed_default(v, "int")?))));
        registry.register("binary", |v| Ok(boxed(Binary::new(typed_default(v, "int")?))));
        registry.register("url", |v| {
            Ok(boxed(Url::new(typed_default::<String>(v, "str")?)?))
        });
        registry.register("datetime", |v| {
            Ok(boxed(DateTime::new(typed_default::<DateTimeValue>(v, "datetime")?)))
        });
        registry.register("timedelta", |v| {
            Ok(boxed(TimeDelta::new(typed_default(v, "timedelta")?)))
        });
        registry
    }

    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Add or replace a constructor.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(Value) -> Result<Box<dyn ErasedConverter>, InvalidDefaultError> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(converter = %name, "Registering converter");
        self.constructors.insert(name, Box::new(constructor));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub fn build(
        &self,
        name: &str,
        default: Value,
    ) -> Result<Box<dyn ErasedConverter>, InvalidDefaultError> {
        let constructor =
            self.constructors
                .get(name)
                .ok_or_else(|| InvalidDefaultError::UnknownConverter {
                    name: name.to_string(),
                })?;
        constructor(default)
    }

    /// Optional converter over `name` that starts out absent.
    ///
    /// `inner_default` backs the inner converter.
    pub fn build_optional(
        &self,
        name: &str,
        inner_default: Value,
    ) -> Result<Box<dyn ErasedConverter>, InvalidDefaultError> {
        let inner = self.build(name, inner_default)?;
        Ok(Box::new(ErasedOptional::absent(inner)))
    }
}
