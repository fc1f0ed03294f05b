//! # Optional Wrapper
//!
//! Delegates to an inner converter and additionally maps the null tokens
//! (`none`, `null`, `nil`) to an absent value.

use crate::converter::{Converter, Slot, TypeTag};
use crate::primitive::is_null_token;
use errors::{ConversionError, InvalidConverterError};

#[derive(Debug, Clone, PartialEq)]
pub struct Optional<C: Converter> {
    inner: C,
    slot: Slot<Option<C::Value>>,
}

impl<C: Converter> Optional<C> {
    /// Optional whose default is the inner converter's default.
    pub fn new(inner: C) -> Self {
        let default = Some(inner.default_value().clone());
        let mut optional = Self {
            slot: Slot::new(default),
            inner,
        };
        optional.slot.set(Some(optional.inner.value().clone()));
        optional
    }

    /// Optional whose default is absent.
    pub fn absent(inner: C) -> Self {
        Self {
            inner,
            slot: Slot::new(None),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: Converter> Converter for Optional<C> {
    type Value = Option<C::Value>;

    fn declared_type(&self) -> TypeTag {
        TypeTag::optional(self.inner.declared_type())
    }

    fn default_value(&self) -> &Option<C::Value> {
        self.slot.default_value()
    }

    fn value(&self) -> &Option<C::Value> {
        self.slot.value()
    }

    fn set_value(&mut self, value: Option<C::Value>) {
        if let Some(present) = &value {
            self.inner.set_value(present.clone());
        }
        self.slot.set(value);
    }

    fn convert(&self, raw: &str) -> Result<Option<C::Value>, ConversionError> {
        if is_null_token(raw) {
            return Ok(None);
        }
        self.inner.convert(raw).map(Some)
    }

    fn format(&self, value: &Option<C::Value>) -> String {
        match value {
            Some(present) => self.inner.format(present),
            None => "None".to_string(),
        }
    }

    fn type_of(&self, value: &Option<C::Value>) -> TypeTag {
        match value {
            Some(present) => self.inner.type_of(present),
            None => TypeTag::None,
        }
    }

    fn validate(&self) -> Result<(), InvalidConverterError> {
        match self.value() {
            None => Ok(()),
            Some(_) => self.inner.validate(),
        }
    }
}
