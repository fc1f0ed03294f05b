//! # Environment Store
//!
//! Read-only, flat store over the process environment and an optional
//! `.env` file. Sections are accepted everywhere and ignored.
//!
//! Precedence, lowest to highest:
//! - `.env` file
//! - process environment

use crate::{BackingStore, StoreFormat, io_error};
use errors::StoreError;
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use tracing::debug;

const STORE_NAME: &str = "env";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvStore {
    data: BTreeMap<String, String>,
}

impl EnvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store over explicit entries, without touching the environment.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            data: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Entries of a `.env` file. A key repeated in the file takes its last value.
pub fn parse_dotenv(text: &str) -> BTreeMap<String, String> {
    let mut entries = BTreeMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        entries.insert(key.to_string(), strip_quotes(value.trim()).to_string());
    }
    entries
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn read_only(operation: &'static str) -> StoreError {
    StoreError::ReadOnly {
        store: STORE_NAME,
        operation,
    }
}

impl BackingStore for EnvStore {
    fn format(&self) -> StoreFormat {
        StoreFormat::Env
    }

    fn read(&mut self, path: &Path) -> Result<(), StoreError> {
        let mut data = if path.exists() {
            let text = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
            parse_dotenv(&text)
        } else {
            debug!(path = %path.display(), "No .env file, using process environment only");
            BTreeMap::new()
        };
        data.extend(
            std::env::vars_os()
                .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?))),
        );
        self.data = data;
        Ok(())
    }

    fn write(&self, _out: &mut dyn io::Write) -> Result<(), StoreError> {
        Err(read_only("write"))
    }

    fn has_section(&self, _section: &str) -> bool {
        true
    }

    fn add_section(&mut self, _section: &str) -> Result<(), StoreError> {
        Ok(())
    }

    fn has_option(&self, _section: &str, key: &str) -> bool {
        self.data.contains_key(key)
    }

    fn remove_option(&mut self, _section: &str, key: &str) -> Result<bool, StoreError> {
        Ok(self.data.remove(key).is_some())
    }

    fn get(&self, _section: &str, key: &str) -> Option<String> {
        self.data.get(key).cloned()
    }

    fn set(&mut self, _section: &str, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(read_only("set"))
    }

    fn is_read_only(&self) -> bool {
        true
    }
}
