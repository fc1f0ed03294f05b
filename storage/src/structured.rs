//! # Structured Store
//!
//! JSON, YAML and TOML files share one in-memory tree of nested mappings.
//! A dotted section such as `Database.pool` addresses the mapping
//! `{"Database": {"pool": {...}}}`.
//!
//! Values written through the store are strings. Values already in the file
//! may be any scalar and are read back in their text form.

use crate::{BackingStore, StoreFormat, encode_error, io_error, parse_error};
use errors::StoreError;
use serde_json::{Map, Value as JsonValue};
use std::io;
use std::path::Path;
use tracing::{debug, info};

pub const SECTION_SEPARATOR: char = '.';

#[derive(Debug, Clone, PartialEq)]
pub struct StructuredStore {
    format: StoreFormat,
    data: Map<String, JsonValue>,
}

impl StructuredStore {
    pub fn new(format: StoreFormat) -> Self {
        Self {
            format,
            data: Map::new(),
        }
    }

    /// The whole tree.
    pub fn data(&self) -> &Map<String, JsonValue> {
        &self.data
    }

    /// Parse text in this store's format, replacing the current contents.
    pub fn parse(&mut self, text: &str) -> Result<(), StoreError> {
        if text.trim().is_empty() {
            self.data.clear();
            return Ok(());
        }

        let value = match self.format {
            StoreFormat::Json => {
                serde_json::from_str::<JsonValue>(text).map_err(|e| parse_error(self.format, e))?
            }
            StoreFormat::Yaml => serde_yaml::from_str::<JsonValue>(text)
                .map_err(|e| parse_error(self.format, e))?,
            StoreFormat::Toml => {
                let table = toml::from_str::<toml::Table>(text)
                    .map_err(|e| parse_error(self.format, e))?;
                toml_to_json(toml::Value::Table(table))
            }
            StoreFormat::Ini | StoreFormat::Env => {
                return Err(parse_error(self.format, "not a structured format"));
            }
        };

        self.data = match value {
            JsonValue::Object(map) => map,
            JsonValue::Null => Map::new(),
            other => {
                return Err(parse_error(
                    self.format,
                    format!("top level must be a mapping, got {other}"),
                ));
            }
        };
        Ok(())
    }

    /// Serialized text in this store's format.
    pub fn render(&self) -> Result<String, StoreError> {
        match self.format {
            StoreFormat::Json => serde_json::to_string_pretty(&self.data)
                .map(|mut text| {
                    text.push('\n');
                    text
                })
                .map_err(|e| encode_error(self.format, e)),
            StoreFormat::Yaml => {
                if self.data.is_empty() {
                    return Ok(String::new());
                }
                serde_yaml::to_string(&self.data).map_err(|e| encode_error(self.format, e))
            }
            StoreFormat::Toml => {
                toml::to_string_pretty(&self.data).map_err(|e| encode_error(self.format, e))
            }
            StoreFormat::Ini | StoreFormat::Env => {
                Err(encode_error(self.format, "not a structured format"))
            }
        }
    }

    fn empty_file_contents(&self) -> &'static str {
        match self.format {
            StoreFormat::Json => "{}",
            _ => "",
        }
    }

    fn table(&self, section: &str) -> Option<&Map<String, JsonValue>> {
        let mut current = &self.data;
        for part in section.split(SECTION_SEPARATOR) {
            current = current.get(part)?.as_object()?;
        }
        Some(current)
    }

    fn table_mut(&mut self, section: &str) -> Option<&mut Map<String, JsonValue>> {
        let mut current = &mut self.data;
        for part in section.split(SECTION_SEPARATOR) {
            current = current.get_mut(part)?.as_object_mut()?;
        }
        Some(current)
    }

    /// Walk `section`, creating missing mappings on the way.
    fn ensure_table(&mut self, section: &str) -> Result<&mut Map<String, JsonValue>, StoreError> {
        let mut current = &mut self.data;
        for part in section.split(SECTION_SEPARATOR) {
            let entry = current
                .entry(part.to_string())
                .or_insert_with(|| JsonValue::Object(Map::new()));
            current = entry.as_object_mut().ok_or_else(|| StoreError::NotATable {
                section: section.to_string(),
            })?;
        }
        Ok(current)
    }
}

/// Text form of a scalar read from the file.
fn scalar_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(text) => text.clone(),
        JsonValue::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn toml_to_json(value: toml::Value) -> JsonValue {
    match value {
        toml::Value::String(text) => JsonValue::String(text),
        toml::Value::Integer(n) => JsonValue::from(n),
        toml::Value::Float(f) => JsonValue::from(f),
        toml::Value::Boolean(b) => JsonValue::Bool(b),
        toml::Value::Datetime(dt) => JsonValue::String(dt.to_string()),
        toml::Value::Array(items) => JsonValue::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => JsonValue::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}

impl BackingStore for StructuredStore {
    fn format(&self) -> StoreFormat {
        self.format
    }

    fn read(&mut self, path: &Path) -> Result<(), StoreError> {
        if !path.exists() {
            info!(path = %path.display(), format = %self.format, "Creating empty config file");
            std::fs::write(path, self.empty_file_contents()).map_err(|e| io_error(path, e))?;
            self.data.clear();
            return Ok(());
        }
        let text = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        self.parse(&text)?;
        debug!(path = %path.display(), sections = self.data.len(), "Read structured config");
        Ok(())
    }

    fn write(&self, out: &mut dyn io::Write) -> Result<(), StoreError> {
        let text = self.render()?;
        out.write_all(text.as_bytes())
            .map_err(|e| encode_error(self.format, e))
    }

    fn has_section(&self, section: &str) -> bool {
        self.table(section).is_some()
    }

    fn add_section(&mut self, section: &str) -> Result<(), StoreError> {
        self.ensure_table(section).map(|_| ())
    }

    fn has_option(&self, section: &str, key: &str) -> bool {
        self.table(section).is_some_and(|t| t.contains_key(key))
    }

    fn remove_option(&mut self, section: &str, key: &str) -> Result<bool, StoreError> {
        Ok(self
            .table_mut(section)
            .is_some_and(|t| t.remove(key).is_some()))
    }

    fn get(&self, section: &str, key: &str) -> Option<String> {
        self.table(section)
            .and_then(|t| t.get(key))
            .map(scalar_text)
    }

    fn set(&mut self, section: &str, key: &str, value: &str) -> Result<(), StoreError> {
        self.ensure_table(section)?
            .insert(key.to_string(), JsonValue::String(value.to_string()));
        Ok(())
    }
}
