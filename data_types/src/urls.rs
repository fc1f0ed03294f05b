//! URL converter.
//!
//! Values are kept as their canonical string form. A URL is accepted only
//! when it has both a scheme and a host; the default is checked the same
//! way at construction.

use crate::converter::{Converter, Slot, TypeTag};
use errors::{ConversionError, InvalidDefaultError};
use url::Url as ParsedUrl;

#[derive(Debug, Clone, PartialEq)]
pub struct Url {
    slot: Slot<String>,
}

impl Url {
    pub fn new(default: impl Into<String>) -> Result<Self, InvalidDefaultError> {
        let default = default.into();
        let canonical =
            normalize(&default).map_err(|err| InvalidDefaultError::Malformed {
                default: default.clone(),
                reason: err.to_string(),
            })?;
        Ok(Self {
            slot: Slot::new(canonical),
        })
    }
}

impl Converter for Url {
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
        normalize(raw)
    }

    fn format(&self, value: &String) -> String {
        value.clone()
    }
}

/// Parse `raw` and return its canonical form.
///
/// Scheme and host are lowercased by the parser. The root path `/` the
/// parser adds to bare authorities is dropped again so `https://host`
/// stays `https://host`.
pub fn normalize(raw: &str) -> Result<String, ConversionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConversionError::EmptyInput { kind: "URL" });
    }

    let parsed = ParsedUrl::parse(trimmed).map_err(|e| ConversionError::InvalidUrl {
        input: raw.to_string(),
        reason: e.to_string(),
    })?;

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(ConversionError::InvalidUrl {
            input: raw.to_string(),
            reason: "URL must have scheme and netloc.".to_string(),
        });
    }

    let mut canonical = parsed.as_str().to_string();
    let added_root = parsed.path() == "/"
        && parsed.query().is_none()
        && parsed.fragment().is_none()
        && !trimmed.ends_with('/');
    if added_root {
        canonical.pop();
    }

    Ok(canonical)
}
