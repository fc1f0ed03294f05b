//! # List Converter
//!
//! Ordered sequences of one element type, stored as a single line of
//! comma-separated fields.
//!
//! Each field is escaped before joining: `\` becomes `\\`, then `,`
//! becomes `\,`. Parsing is a single left-to-right scan. The last field is
//! always emitted, even when empty, and only the empty string parses to an
//! empty list.

use crate::converter::{Converter, Slot, TypeTag};
use crate::factory::IntoConverter;
use errors::{ConversionError, InvalidDefaultError};

pub const SEPARATOR: char = ',';
pub const ESCAPE: char = '\\';

#[derive(Debug, Clone, PartialEq)]
pub struct List<C: Converter> {
    element: C,
    slot: Slot<Vec<C::Value>>,
}

impl<C: Converter> List<C> {
    /// List whose elements go through `element`. An empty default is fine.
    pub fn with_element(default: Vec<C::Value>, element: C) -> Self {
        Self {
            element,
            slot: Slot::new(default),
        }
    }

    /// List whose element converter is selected from the first default element.
    pub fn infer(default: Vec<C::Value>) -> Result<Self, InvalidDefaultError>
    where
        C::Value: IntoConverter<Converter = C>,
    {
        let first = default
            .first()
            .cloned()
            .ok_or(InvalidDefaultError::EmptyList)?;
        let element = first.into_converter()?;
        Ok(Self::with_element(default, element))
    }

    pub fn element(&self) -> &C {
        &self.element
    }
}

impl<C: Converter> Converter for List<C> {
    type Value = Vec<C::Value>;

    fn declared_type(&self) -> TypeTag {
        TypeTag::list_of(self.element.declared_type())
    }

    fn default_value(&self) -> &Vec<C::Value> {
        self.slot.default_value()
    }

    fn value(&self) -> &Vec<C::Value> {
        self.slot.value()
    }

    fn set_value(&mut self, value: Vec<C::Value>) {
        self.slot.set(value);
    }

    fn convert(&self, raw: &str) -> Result<Vec<C::Value>, ConversionError> {
        if raw.is_empty() {
            return Ok(Vec::new());
        }
        split_escaped(raw)
            .iter()
            .map(|field| self.element.convert(field))
            .collect()
    }

    fn format(&self, value: &Vec<C::Value>) -> String {
        value
            .iter()
            .map(|item| escape(&self.element.format(item)))
            .collect::<Vec<_>>()
            .join(&SEPARATOR.to_string())
    }
}

/// Escape the escape character first, then the separator.
pub fn escape(field: &str) -> String {
    field
        .replace(ESCAPE, &format!("{ESCAPE}{ESCAPE}"))
        .replace(SEPARATOR, &format!("{ESCAPE}{SEPARATOR}"))
}

/// Split on unescaped separators, resolving `\,` and `\\`.
///
/// Any other backslash is kept as is.
pub fn split_escaped(raw: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ESCAPE {
            match chars.next_if(|next| *next == SEPARATOR || *next == ESCAPE) {
                Some(escaped) => current.push(escaped),
                None => current.push(c),
            }
        } else if c == SEPARATOR {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    fields.push(current);

    fields
}
