//! # Backing Stores
//!
//! Section/key/value storage behind a configuration file.
//!
//! This crate provides:
//! - The `BackingStore` contract shared by every file format
//! - INI files with dotted section names for nesting
//! - JSON, YAML and TOML files with native nested mappings
//! - A read-only store over the process environment and a `.env` file
//! - Format detection from the file extension

pub mod env;
pub mod ini;
pub mod structured;

pub use env::EnvStore;
pub use ini::IniStore;
pub use structured::StructuredStore;

use errors::StoreError;
use std::fmt;
use std::io;
use std::path::Path;
use strum::{Display, EnumString, IntoStaticStr};
use tracing::debug;

/// File format of a backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum StoreFormat {
    Ini,
    Json,
    Yaml,
    Toml,
    Env,
}

impl StoreFormat {
    /// Detect the format from the file extension (case-insensitive).
    ///
    /// `.env` files are matched by name as well, since `Path::extension`
    /// reports none for them.
    pub fn from_path(path: &Path) -> Result<Self, StoreError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_lowercase();
        if file_name == ".env" {
            return Ok(Self::Env);
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_lowercase();

        match extension.as_str() {
            "ini" | "cfg" | "conf" => Ok(Self::Ini),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            "env" => Ok(Self::Env),
            other => Err(StoreError::UnsupportedFormat {
                extension: other.to_string(),
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Section/key/value store backing a configuration file.
///
/// Values are always strings. Section names may contain dots; stores with
/// native nesting treat each dot as one level.
pub trait BackingStore: Send + fmt::Debug {
    fn format(&self) -> StoreFormat;

    /// Replace the contents with those of `path`.
    fn read(&mut self, path: &Path) -> Result<(), StoreError>;

    fn write(&self, out: &mut dyn io::Write) -> Result<(), StoreError>;

    fn has_section(&self, section: &str) -> bool;

    fn add_section(&mut self, section: &str) -> Result<(), StoreError>;

    fn has_option(&self, section: &str, key: &str) -> bool;

    /// Returns whether the option existed.
    fn remove_option(&mut self, section: &str, key: &str) -> Result<bool, StoreError>;

    fn get(&self, section: &str, key: &str) -> Option<String>;

    fn get_or(&self, section: &str, key: &str, fallback: &str) -> String {
        self.get(section, key)
            .unwrap_or_else(|| fallback.to_string())
    }

    fn set(&mut self, section: &str, key: &str, value: &str) -> Result<(), StoreError>;

    /// Stores that reject `set` and `write`.
    fn is_read_only(&self) -> bool {
        false
    }
}

/// Empty store for `format`.
pub fn new_store(format: StoreFormat) -> Box<dyn BackingStore> {
    match format {
        StoreFormat::Ini => Box::new(IniStore::new()),
        StoreFormat::Json | StoreFormat::Yaml | StoreFormat::Toml => {
            Box::new(StructuredStore::new(format))
        }
        StoreFormat::Env => Box::new(EnvStore::new()),
    }
}

/// Detect the store from the extension of `path` and read it.
pub fn open_store(path: &Path) -> Result<Box<dyn BackingStore>, StoreError> {
    let format = StoreFormat::from_path(path)?;
    debug!(path = %path.display(), format = %format, "Opening config store");
    let mut store = new_store(format);
    store.read(path)?;
    Ok(store)
}

/// Serialize `store` and replace the file at `path` with the result.
pub fn write_store(store: &dyn BackingStore, path: &Path) -> Result<(), StoreError> {
    let mut buffer = Vec::new();
    store.write(&mut buffer)?;
    std::fs::write(path, buffer).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), format = %store.format(), "Wrote config store");
    Ok(())
}

pub(crate) fn encode_error(format: StoreFormat, err: impl fmt::Display) -> StoreError {
    StoreError::Encode {
        format: format.as_str(),
        reason: err.to_string(),
    }
}

pub(crate) fn parse_error(format: StoreFormat, err: impl fmt::Display) -> StoreError {
    StoreError::Parse {
        format: format.as_str(),
        reason: err.to_string(),
    }
}

pub(crate) fn io_error(path: &Path, source: io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_detects_format_from_extension() {
        let cases = [
            ("app.ini", StoreFormat::Ini),
            ("app.cfg", StoreFormat::Ini),
            ("APP.CONF", StoreFormat::Ini),
            ("app.json", StoreFormat::Json),
            ("app.yaml", StoreFormat::Yaml),
            ("app.yml", StoreFormat::Yaml),
            ("app.toml", StoreFormat::Toml),
            (".env", StoreFormat::Env),
            ("prod.env", StoreFormat::Env),
        ];
        for (name, expected) in cases {
            assert_eq!(
                StoreFormat::from_path(&PathBuf::from(name)).unwrap(),
                expected,
                "{name}"
            );
        }
    }

    #[test]
    fn test_unsupported_extension() {
        let err = StoreFormat::from_path(Path::new("settings.xml")).unwrap_err();
        assert!(matches!(
            err,
            StoreError::UnsupportedFormat { extension } if extension == "xml"
        ));
        assert!(StoreFormat::from_path(Path::new("settings")).is_err());
    }

    #[test]
    fn test_format_names() {
        assert_eq!(StoreFormat::Yaml.to_string(), "yaml");
        assert_eq!(StoreFormat::Toml.as_str(), "toml");
    }

    #[test]
    fn test_open_and_write_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.ini");

        let mut store = open_store(&path).unwrap();
        assert_eq!(store.format(), StoreFormat::Ini);
        store.set("Server", "port", "8080").unwrap();
        write_store(store.as_ref(), &path).unwrap();

        let reopened = open_store(&path).unwrap();
        assert_eq!(reopened.get("Server", "port").as_deref(), Some("8080"));
        assert_eq!(reopened.get_or("Server", "host", "localhost"), "localhost");
    }
}
