//! # Configuration Errors
//!
//! Error taxonomy for typed configuration values.
//!
//! - `ConversionError`: a stored string could not be turned into a value
//! - `InvalidDefaultError`: a converter was constructed with an unusable default
//! - `InvalidConverterError`: a converted value disagrees with its declared type
//! - `StoreError`: the backing file could not be read, parsed or written
//! - `ConfigError`: umbrella error returned by the binding layer
//!
//! Every error is scoped to one configuration point or one store and is
//! returned to the caller; nothing here is fatal to the process.

use std::path::PathBuf;
use thiserror::Error;

/// Convert-time failures: malformed string input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("Cannot convert {input:?} to boolean")]
    InvalidBoolean { input: String },

    #[error("Cannot parse {input:?} as a base {base} integer: {reason}")]
    InvalidInteger {
        input: String,
        base: u32,
        reason: String,
    },

    #[error("Base {found} in {input:?} does not match converter base {expected}")]
    BaseMismatch {
        input: String,
        expected: u32,
        found: u32,
    },

    #[error("Cannot parse {input:?} as a float: {reason}")]
    InvalidFloat { input: String, reason: String },

    #[error("{kind} string cannot be empty")]
    EmptyInput { kind: &'static str },

    #[error("Invalid URL: {input}. {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("Invalid datetime format: {input}. Expected ISO 8601 format (YYYY-MM-DDTHH:MM:SS)")]
    InvalidDateTime { input: String },

    #[error("Invalid duration format: {input}")]
    InvalidDuration { input: String },

    #[error("Unknown time unit: {unit}")]
    UnknownTimeUnit { unit: String },

    #[error("{input:?} is not a member of {type_name}")]
    UnknownEnumMember { type_name: String, input: String },

    #[error("{input:?} is not a null token")]
    NotNull { input: String },
}

/// Construction-time failures: the default cannot back a converter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidDefaultError {
    #[error(
        "List default must have at least one element to infer its element type, or an element converter must be given"
    )]
    EmptyList,

    #[error("A None default needs an explicitly selected converter")]
    UntypedNone,

    /// The default is not an instance of the type the converter requires.
    #[error("Default value must be a {expected} value, got {found}")]
    WrongType {
        expected: &'static str,
        found: String,
    },

    /// The default has the right type but an unusable value.
    #[error("Invalid default {default:?}: {reason}")]
    Malformed { default: String, reason: String },

    #[error("Unsupported integer base {base}, expected 2 to 36")]
    UnsupportedBase { base: u32 },

    #[error("No converter is registered under {name:?}")]
    UnknownConverter { name: String },
}

/// Validation-time failures: the live value disagrees with the declared type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidConverterError {
    #[error("Value of type {found} is not a {expected}")]
    TypeMismatch { expected: String, found: String },

    #[error("Invalid value for {section}.{key}: expected {expected}, got {found}")]
    SettingTypeMismatch {
        section: String,
        key: String,
        expected: String,
        found: String,
    },
}

impl InvalidConverterError {
    /// Attach the configuration point the failure belongs to.
    pub fn at(self, section: &str, key: &str) -> Self {
        match self {
            Self::TypeMismatch { expected, found }
            | Self::SettingTypeMismatch {
                expected, found, ..
            } => Self::SettingTypeMismatch {
                section: section.to_string(),
                key: key.to_string(),
                expected,
                found,
            },
        }
    }
}

/// Backing store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format}: {reason}")]
    Parse { format: &'static str, reason: String },

    #[error("Failed to encode {format}: {reason}")]
    Encode { format: &'static str, reason: String },

    #[error("Unsupported config file format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("{store} store does not support {operation}")]
    ReadOnly {
        store: &'static str,
        operation: &'static str,
    },

    #[error("Section {section} is not a table")]
    NotATable { section: String },
}

/// Umbrella error of the value-binding layer.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    InvalidDefault(#[from] InvalidDefaultError),

    #[error(transparent)]
    InvalidConverter(#[from] InvalidConverterError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Config value {section}.{key} is not set and no default value is given")]
    MissingOption { section: String, key: String },

    #[error("Failed to watch {path:?}: {reason}")]
    Watch { path: PathBuf, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_relocates_to_setting() {
        let err = InvalidConverterError::TypeMismatch {
            expected: "int".to_string(),
            found: "str".to_string(),
        }
        .at("Server", "port");

        assert_eq!(
            err,
            InvalidConverterError::SettingTypeMismatch {
                section: "Server".to_string(),
                key: "port".to_string(),
                expected: "int".to_string(),
                found: "str".to_string(),
            }
        );
        assert_eq!(
            err.to_string(),
            "Invalid value for Server.port: expected int, got str"
        );
    }

    #[test]
    fn test_config_error_wraps_conversion_error() {
        let err: ConfigError = ConversionError::InvalidBoolean {
            input: "maybe".to_string(),
        }
        .into();
        assert!(matches!(err, ConfigError::Conversion(_)));
        assert!(err.to_string().contains("maybe"));
    }

    #[test]
    fn test_read_only_message() {
        let err = StoreError::ReadOnly {
            store: "env",
            operation: "set",
        };
        assert_eq!(err.to_string(), "env store does not support set");
    }
}
