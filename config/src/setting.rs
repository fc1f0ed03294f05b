//! # Settings
//!
//! A setting binds one converter to `section.key` of a scope.
//!
//! - `declare` writes the serialized default when the option is missing
//! - `get` reads the stored string, converts it and validates the result
//! - `set` assigns a value and stores its serialized form
//!
//! Change hooks run whenever a read observes a value different from the
//! previous live value, and whenever a write changes it.

use crate::scope::ConfigScope;
use data_types::{Converter, ErasedConverter, IntoConverter, Value};
use errors::{ConfigError, InvalidConverterError};
use std::fmt;
use strum::Display;
use tracing::{debug, warn};

/// What triggered a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ChangeOrigin {
    Get,
    Set,
}

pub type ChangeHook<T> = Box<dyn Fn(ChangeOrigin, &T, &T) + Send + Sync>;

pub struct Setting<C: Converter> {
    scope: ConfigScope,
    section: String,
    key: String,
    converter: C,
    hooks: Vec<ChangeHook<C::Value>>,
}

impl<C: Converter> fmt::Debug for Setting<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setting")
            .field("section", &self.section)
            .field("key", &self.key)
            .field("converter", &self.converter)
            .field("hooks", &self.hooks.len())
            .finish_non_exhaustive()
    }
}

impl<C: Converter> Setting<C> {
    pub fn declare(
        scope: &ConfigScope,
        section: impl Into<String>,
        key: impl Into<String>,
        converter: C,
    ) -> Result<Self, ConfigError> {
        let section = section.into();
        let key = key.into();
        scope.ensure_option(&section, &key, &converter.serialize())?;
        debug!(section = %section, key = %key, declared = %converter.declared_type(), "Declared setting");
        Ok(Self {
            scope: scope.clone(),
            section,
            key,
            converter,
            hooks: Vec::new(),
        })
    }

    /// Declare with the converter selected by the default's type.
    pub fn from_default<T>(
        scope: &ConfigScope,
        section: impl Into<String>,
        key: impl Into<String>,
        default: T,
    ) -> Result<Self, ConfigError>
    where
        T: IntoConverter<Converter = C>,
    {
        let converter = default.into_converter()?;
        Self::declare(scope, section, key, converter)
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    pub fn scope(&self) -> &ConfigScope {
        &self.scope
    }

    /// Live value as of the last `get` or `set`.
    pub fn value(&self) -> &C::Value {
        self.converter.value()
    }

    pub fn default(&self) -> &C::Value {
        self.converter.default_value()
    }

    pub fn on_change<F>(&mut self, hook: F)
    where
        F: Fn(ChangeOrigin, &C::Value, &C::Value) + Send + Sync + 'static,
    {
        self.hooks.push(Box::new(hook));
    }

    /// Read, convert and validate the stored value.
    ///
    /// A missing option (possible on read-only stores) yields the default.
    pub fn get(&mut self) -> Result<C::Value, ConfigError> {
        let new = match self.scope.get_raw(&self.section, &self.key) {
            Some(raw) => self.converter.convert(&raw)?,
            None => self.converter.default_value().clone(),
        };
        let old = self.converter.value().clone();
        self.converter.set_value(new.clone());

        if self.scope.options().validate_types {
            if let Err(err) = self.converter.validate() {
                warn!(section = %self.section, key = %self.key, error = %err, "Config value failed validation");
                return Err(err.at(&self.section, &self.key).into());
            }
        }

        if old != new {
            self.notify(ChangeOrigin::Get, &old, &new);
        }
        Ok(new)
    }

    /// Store the serialized form of `value`, then make it the live value.
    ///
    /// A failed store leaves the live value and the hooks untouched.
    pub fn set(&mut self, value: C::Value) -> Result<(), ConfigError> {
        self.scope
            .set_raw(&self.section, &self.key, &self.converter.format(&value))?;
        let old = self.converter.value().clone();
        self.converter.set_value(value.clone());
        if old != value {
            self.notify(ChangeOrigin::Set, &old, &value);
        }
        Ok(())
    }

    /// Store the default again.
    pub fn reset(&mut self) -> Result<(), ConfigError> {
        let default = self.converter.default_value().clone();
        self.set(default)
    }

    fn notify(&self, origin: ChangeOrigin, old: &C::Value, new: &C::Value) {
        debug!(
            section = %self.section,
            key = %self.key,
            origin = %origin,
            old = ?old,
            new = ?new,
            "Config value changed"
        );
        for hook in &self.hooks {
            hook(origin, old, new);
        }
    }
}

/// Setting over a converter chosen at runtime, see
/// [`ConverterRegistry`](data_types::ConverterRegistry).
#[derive(Debug)]
pub struct DynamicSetting {
    scope: ConfigScope,
    section: String,
    key: String,
    converter: Box<dyn ErasedConverter>,
}

impl DynamicSetting {
    pub fn declare(
        scope: &ConfigScope,
        section: impl Into<String>,
        key: impl Into<String>,
        converter: Box<dyn ErasedConverter>,
    ) -> Result<Self, ConfigError> {
        let section = section.into();
        let key = key.into();
        scope.ensure_option(&section, &key, &converter.serialize())?;
        Ok(Self {
            scope: scope.clone(),
            section,
            key,
            converter,
        })
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> Value {
        self.converter.value()
    }

    pub fn get(&mut self) -> Result<Value, ConfigError> {
        let new = match self.scope.get_raw(&self.section, &self.key) {
            Some(raw) => self.converter.convert_value(&raw)?,
            None => self.converter.default_value(),
        };
        self.converter.set_value(new.clone()).map_err(|err| self.locate(err))?;
        if self.scope.options().validate_types {
            self.converter.validate().map_err(|err| self.locate(err))?;
        }
        Ok(new)
    }

    /// Fails without touching the store when `value` does not fit the
    /// declared type. A failed store keeps the previous live value.
    pub fn set(&mut self, value: Value) -> Result<(), ConfigError> {
        let old = self.converter.value();
        self.converter.set_value(value).map_err(|err| self.locate(err))?;
        if let Err(e) = self
            .scope
            .set_raw(&self.section, &self.key, &self.converter.serialize())
        {
            if let Err(restore) = self.converter.set_value(old) {
                warn!(section = %self.section, key = %self.key, error = %restore, "Failed to restore live value");
            }
            return Err(e);
        }
        Ok(())
    }

    fn locate(&self, err: InvalidConverterError) -> ConfigError {
        err.at(&self.section, &self.key).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ScopeOptions;
    use data_types::{ConverterRegistry, Hex, Integer, List, Optional, Text, TypeTag};
    use errors::{ConversionError, StoreError};
    use parking_lot::Mutex;
    use storage::EnvStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn scope(dir: &TempDir) -> ConfigScope {
        ConfigScope::open(dir.path().join("app.ini")).unwrap()
    }

    /// Converter whose live value can take a shape it does not declare.
    #[derive(Debug)]
    struct Mislabeled {
        slot: data_types::Slot<String>,
    }

    impl Converter for Mislabeled {
        type Value = String;

        fn declared_type(&self) -> TypeTag {
            TypeTag::Int
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
            Ok(raw.to_string())
        }

        fn format(&self, value: &String) -> String {
            value.clone()
        }

        fn type_of(&self, value: &String) -> TypeTag {
            if value.parse::<i64>().is_ok() {
                TypeTag::Int
            } else {
                TypeTag::Str
            }
        }
    }

    #[test]
    fn test_declare_materializes_default() {
        let dir = TempDir::new().unwrap();
        let scope = scope(&dir);
        let setting = Setting::declare(&scope, "Server", "port", Hex::new(42)).unwrap();

        assert_eq!(scope.get_raw("Server", "port").as_deref(), Some("0x2a"));
        assert_eq!(setting.value(), &42);
    }

    #[test]
    fn test_declare_keeps_existing_value() {
        let dir = TempDir::new().unwrap();
        let scope = scope(&dir);
        scope.set_raw("Server", "port", "9000").unwrap();

        let mut setting = Setting::from_default(&scope, "Server", "port", 8080_i64).unwrap();
        assert_eq!(setting.get().unwrap(), 9000);
        assert_eq!(setting.default(), &8080);
    }

    #[test]
    fn test_set_persists_serialized_form() {
        let dir = TempDir::new().unwrap();
        let scope = scope(&dir);
        let mut setting = Setting::from_default(
            &scope,
            "Paths",
            "include",
            vec!["a".to_string(), "b".to_string()],
        )
        .unwrap();

        setting
            .set(vec!["x,y".to_string(), r"c:\tmp".to_string()])
            .unwrap();
        assert_eq!(
            scope.get_raw("Paths", "include").as_deref(),
            Some(r"x\,y,c:\\tmp")
        );
        assert_eq!(
            setting.get().unwrap(),
            vec!["x,y".to_string(), r"c:\tmp".to_string()]
        );
    }

    #[test]
    fn test_get_reports_conversion_error() {
        let dir = TempDir::new().unwrap();
        let scope = scope(&dir);
        let mut setting = Setting::declare(&scope, "Server", "port", Integer::new(1)).unwrap();
        scope.set_raw("Server", "port", "eighty").unwrap();

        assert!(matches!(
            setting.get(),
            Err(ConfigError::Conversion(ConversionError::InvalidInteger { .. }))
        ));
    }

    #[test]
    fn test_validation_failure_names_setting() {
        let dir = TempDir::new().unwrap();
        let scope = scope(&dir);
        let converter = Mislabeled {
            slot: data_types::Slot::new("1".to_string()),
        };
        let mut setting = Setting::declare(&scope, "Server", "workers", converter).unwrap();
        scope.set_raw("Server", "workers", "many").unwrap();

        let err = setting.get().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for Server.workers: expected int, got str"
        );
    }

    #[test]
    fn test_validation_can_be_disabled() {
        let dir = TempDir::new().unwrap();
        let scope = ConfigScope::open_with(
            dir.path().join("app.ini"),
            ScopeOptions {
                validate_types: false,
                ..ScopeOptions::default()
            },
        )
        .unwrap();
        let converter = Mislabeled {
            slot: data_types::Slot::new("1".to_string()),
        };
        let mut setting = Setting::declare(&scope, "Server", "workers", converter).unwrap();
        scope.set_raw("Server", "workers", "many").unwrap();
        assert_eq!(setting.get().unwrap(), "many");
    }

    #[test]
    fn test_optional_round_trip() {
        let dir = TempDir::new().unwrap();
        let scope = scope(&dir);
        let mut setting =
            Setting::declare(&scope, "Auth", "token", Optional::absent(Text::default())).unwrap();

        assert_eq!(scope.get_raw("Auth", "token").as_deref(), Some("None"));
        assert_eq!(setting.get().unwrap(), None);

        setting.set(Some("secret".to_string())).unwrap();
        assert_eq!(setting.get().unwrap(), Some("secret".to_string()));
    }

    #[test]
    fn test_change_hooks() {
        let dir = TempDir::new().unwrap();
        let scope = scope(&dir);
        let mut setting = Setting::declare(&scope, "Server", "port", Integer::new(80)).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        setting.on_change(move |origin, old, new| sink.lock().push((origin, *old, *new)));

        setting.get().unwrap();
        setting.set(443).unwrap();
        setting.set(443).unwrap();
        scope.set_raw("Server", "port", "8443").unwrap();
        setting.get().unwrap();

        assert_eq!(
            *seen.lock(),
            vec![(ChangeOrigin::Set, 80, 443), (ChangeOrigin::Get, 443, 8443)]
        );
    }

    #[test]
    fn test_reset_restores_default() {
        let dir = TempDir::new().unwrap();
        let scope = scope(&dir);
        let mut setting = Setting::from_default(&scope, "App", "name", "demo").unwrap();
        setting.set("other".to_string()).unwrap();
        setting.reset().unwrap();
        assert_eq!(scope.get_raw("App", "name").as_deref(), Some("demo"));
        assert_eq!(setting.value(), "demo");
    }

    #[test]
    fn test_list_without_inferable_default() {
        let dir = TempDir::new().unwrap();
        let scope = scope(&dir);
        let err = Setting::<List<Text>>::from_default(&scope, "App", "tags", Vec::<String>::new())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDefault(_)));
        assert!(!scope.has_option("App", "tags"));
    }

    #[test]
    fn test_dynamic_setting() {
        let dir = TempDir::new().unwrap();
        let scope = scope(&dir);
        let registry = ConverterRegistry::new();
        let converter = registry.build("octal", Value::Int(8)).unwrap();
        let mut setting = DynamicSetting::declare(&scope, "Files", "mode", converter).unwrap();

        assert_eq!(scope.get_raw("Files", "mode").as_deref(), Some("0o10"));
        setting.set(Value::Int(0o644)).unwrap();
        assert_eq!(scope.get_raw("Files", "mode").as_deref(), Some("0o644"));
        assert_eq!(setting.get().unwrap(), Value::Int(0o644));

        let err = setting.set(Value::Bool(true)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for Files.mode: expected int, got bool"
        );
        assert_eq!(scope.get_raw("Files", "mode").as_deref(), Some("0o644"));
    }

    #[test]
    fn test_failed_set_keeps_live_value() {
        let scope = ConfigScope::with_store(
            ".env",
            Box::new(EnvStore::from_entries([("APP_NAME", "demo")])),
            ScopeOptions::default(),
        );
        let mut setting = Setting::declare(&scope, "App", "APP_PORT", Integer::new(80)).unwrap();
        let seen = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&seen);
        setting.on_change(move |_, _, _| *sink.lock() += 1);

        let err = setting.set(5).unwrap_err();
        assert!(matches!(err, ConfigError::Store(StoreError::ReadOnly { .. })));
        assert_eq!(setting.value(), &80);
        assert_eq!(setting.get().unwrap(), 80);
        assert_eq!(*seen.lock(), 0);
    }

    #[test]
    fn test_failed_dynamic_set_keeps_live_value() {
        let scope = ConfigScope::with_store(
            ".env",
            Box::new(EnvStore::from_entries([("APP_NAME", "demo")])),
            ScopeOptions::default(),
        );
        let converter = ConverterRegistry::new().build("int", Value::Int(80)).unwrap();
        let mut setting = DynamicSetting::declare(&scope, "App", "APP_PORT", converter).unwrap();

        assert!(setting.set(Value::Int(5)).is_err());
        assert_eq!(setting.value(), Value::Int(80));
    }
}
