//! # Configuration Scope
//!
//! A scope owns one backing store and the file behind it. Settings receive
//! the scope handle explicitly; clones of the handle share the same store.
//!
//! Every edit goes through the scope, which writes the whole store back to
//! the file when `write_on_edit` is enabled.

use errors::ConfigError;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storage::{BackingStore, StoreFormat, open_store, write_store};
use tracing::{debug, info, warn};

/// Behavior switches of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeOptions {
    /// Write the file after every edit.
    pub write_on_edit: bool,
    /// Check converted values against their declared type on read.
    pub validate_types: bool,
}

impl Default for ScopeOptions {
    fn default() -> Self {
        Self {
            write_on_edit: true,
            validate_types: true,
        }
    }
}

#[derive(Debug)]
struct ScopeState {
    path: PathBuf,
    store: Box<dyn BackingStore>,
    options: ScopeOptions,
}

impl ScopeState {
    fn persist(&self) -> Result<(), ConfigError> {
        if self.options.write_on_edit {
            write_store(self.store.as_ref(), &self.path)?;
        }
        Ok(())
    }

    /// Put `previous` back after a failed write so memory matches the file.
    fn restore(&mut self, section: &str, key: &str, previous: Option<String>) {
        let restored = match previous {
            Some(value) => self.store.set(section, key, &value),
            None => self.store.remove_option(section, key).map(|_| ()),
        };
        if let Err(e) = restored {
            warn!(section, key, error = %e, "Failed to restore config value after write error");
        }
    }
}

/// Shared handle to one configuration file.
#[derive(Debug, Clone)]
pub struct ConfigScope {
    state: Arc<Mutex<ScopeState>>,
}

impl ConfigScope {
    /// Open `path`, picking the store from its extension.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Self::open_with(path, ScopeOptions::default())
    }

    pub fn open_with(path: impl Into<PathBuf>, options: ScopeOptions) -> Result<Self, ConfigError> {
        let path = path.into();
        let store = open_store(&path)?;
        info!(path = %path.display(), format = %store.format(), "Opened config scope");
        Ok(Self::with_store(path, store, options))
    }

    /// Scope over an already loaded store. Nothing is read from `path`.
    pub fn with_store(
        path: impl Into<PathBuf>,
        store: Box<dyn BackingStore>,
        options: ScopeOptions,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScopeState {
                path: path.into(),
                store,
                options,
            })),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.state.lock().path.clone()
    }

    pub fn format(&self) -> StoreFormat {
        self.state.lock().store.format()
    }

    pub fn options(&self) -> ScopeOptions {
        self.state.lock().options
    }

    pub fn set_options(&self, options: ScopeOptions) {
        self.state.lock().options = options;
    }

    pub fn is_read_only(&self) -> bool {
        self.state.lock().store.is_read_only()
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.state.lock().store.has_section(section)
    }

    pub fn has_option(&self, section: &str, key: &str) -> bool {
        self.state.lock().store.has_option(section, key)
    }

    pub fn get_raw(&self, section: &str, key: &str) -> Option<String> {
        self.state.lock().store.get(section, key)
    }

    /// Like `get_raw`, but a missing option is an error.
    pub fn require_raw(&self, section: &str, key: &str) -> Result<String, ConfigError> {
        self.get_raw(section, key)
            .ok_or_else(|| ConfigError::MissingOption {
                section: section.to_string(),
                key: key.to_string(),
            })
    }

    /// Store `value`, creating the section when needed.
    ///
    /// When the file cannot be written the store keeps its previous value.
    pub fn set_raw(&self, section: &str, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut state = self.state.lock();
        if !state.store.has_section(section) {
            state.store.add_section(section)?;
        }
        let previous = state.store.get(section, key);
        state.store.set(section, key, value)?;
        if let Err(e) = state.persist() {
            state.restore(section, key, previous);
            return Err(e);
        }
        debug!(section, key, value, "Config value set");
        Ok(())
    }

    /// Store `value` only when the option is not set yet.
    ///
    /// Returns whether the value was stored.
    pub fn set_default_raw(&self, section: &str, key: &str, value: &str) -> Result<bool, ConfigError> {
        if self.has_option(section, key) {
            return Ok(false);
        }
        self.set_raw(section, key, value)?;
        Ok(true)
    }

    /// Returns whether the option existed.
    pub fn remove_raw(&self, section: &str, key: &str) -> Result<bool, ConfigError> {
        let mut state = self.state.lock();
        let previous = state.store.get(section, key);
        let removed = state.store.remove_option(section, key)?;
        if removed {
            if let Err(e) = state.persist() {
                state.restore(section, key, previous);
                return Err(e);
            }
            debug!(section, key, "Config value removed");
        }
        Ok(removed)
    }

    /// Materialize `default` when the option is missing.
    ///
    /// Read-only stores are left untouched; the caller falls back to its
    /// default on read.
    pub fn ensure_option(&self, section: &str, key: &str, default: &str) -> Result<bool, ConfigError> {
        if self.is_read_only() {
            debug!(section, key, "Read-only store, default not materialized");
            return Ok(false);
        }
        let stored = self.set_default_raw(section, key, default)?;
        if stored {
            info!(section, key, default, "Materialized config default");
        }
        Ok(stored)
    }

    /// Write the store to its file.
    pub fn write(&self) -> Result<(), ConfigError> {
        let state = self.state.lock();
        write_store(state.store.as_ref(), &state.path)?;
        Ok(())
    }

    /// Re-read the file into the store.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let mut state = self.state.lock();
        let path = state.path.clone();
        state.store.read(&path)?;
        debug!(path = %path.display(), "Reloaded config scope");
        Ok(())
    }

    /// Whether `path` is the file behind this scope.
    pub fn is_backed_by(&self, path: &Path) -> bool {
        let own = self.path();
        own == path
            || matches!(
                (own.canonicalize(), path.canonicalize()),
                (Ok(a), Ok(b)) if a == b
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use errors::StoreError;
    use storage::{EnvStore, IniStore};
    use tempfile::TempDir;

    fn ini_scope(dir: &TempDir) -> ConfigScope {
        ConfigScope::open(dir.path().join("app.ini")).unwrap()
    }

    #[test]
    fn test_set_raw_writes_file() {
        let dir = TempDir::new().unwrap();
        let scope = ini_scope(&dir);

        scope.set_raw("Server", "port", "8080").unwrap();

        let text = std::fs::read_to_string(scope.path()).unwrap();
        assert_eq!(text, "[Server]\nport = 8080\n\n");
        assert_eq!(scope.get_raw("Server", "port").as_deref(), Some("8080"));
    }

    #[test]
    fn test_write_on_edit_disabled() {
        let dir = TempDir::new().unwrap();
        let scope = ConfigScope::open_with(
            dir.path().join("app.ini"),
            ScopeOptions {
                write_on_edit: false,
                ..ScopeOptions::default()
            },
        )
        .unwrap();

        scope.set_raw("Server", "port", "8080").unwrap();
        assert!(!scope.path().exists());

        scope.write().unwrap();
        assert!(scope.path().exists());
    }

    #[test]
    fn test_require_raw_reports_missing_option() {
        let dir = TempDir::new().unwrap();
        let scope = ini_scope(&dir);
        let err = scope.require_raw("Server", "host").unwrap_err();
        assert!(matches!(err, ConfigError::MissingOption { .. }));
        assert_eq!(
            err.to_string(),
            "Config value Server.host is not set and no default value is given"
        );
    }

    #[test]
    fn test_set_default_raw_only_when_absent() {
        let dir = TempDir::new().unwrap();
        let scope = ini_scope(&dir);
        assert!(scope.set_default_raw("A", "x", "1").unwrap());
        assert!(!scope.set_default_raw("A", "x", "2").unwrap());
        assert_eq!(scope.get_raw("A", "x").as_deref(), Some("1"));
    }

    #[test]
    fn test_remove_raw() {
        let dir = TempDir::new().unwrap();
        let scope = ini_scope(&dir);
        scope.set_raw("A", "x", "1").unwrap();
        assert!(scope.remove_raw("A", "x").unwrap());
        assert!(!scope.has_option("A", "x"));
        assert!(!scope.remove_raw("A", "x").unwrap());
    }

    #[test]
    fn test_failed_write_keeps_previous_value() {
        let dir = TempDir::new().unwrap();
        let scope = ConfigScope::with_store(
            dir.path().join("missing").join("app.ini"),
            Box::new(IniStore::new()),
            ScopeOptions::default(),
        );

        let err = scope.set_raw("A", "x", "1").unwrap_err();
        assert!(matches!(err, ConfigError::Store(StoreError::Io { .. })));
        assert!(!scope.has_option("A", "x"));

        scope.set_options(ScopeOptions {
            write_on_edit: false,
            ..ScopeOptions::default()
        });
        scope.set_raw("A", "x", "1").unwrap();
        scope.set_options(ScopeOptions::default());

        assert!(scope.set_raw("A", "x", "2").is_err());
        assert_eq!(scope.get_raw("A", "x").as_deref(), Some("1"));
        assert!(scope.remove_raw("A", "x").is_err());
        assert_eq!(scope.get_raw("A", "x").as_deref(), Some("1"));
    }

    #[test]
    fn test_clones_share_store() {
        let dir = TempDir::new().unwrap();
        let scope = ini_scope(&dir);
        let other = scope.clone();
        other.set_raw("A", "x", "1").unwrap();
        assert_eq!(scope.get_raw("A", "x").as_deref(), Some("1"));
    }

    #[test]
    fn test_reload_picks_up_external_edit() {
        let dir = TempDir::new().unwrap();
        let scope = ini_scope(&dir);
        scope.set_raw("A", "x", "1").unwrap();

        std::fs::write(scope.path(), "[A]\nx = 2\n").unwrap();
        assert_eq!(scope.get_raw("A", "x").as_deref(), Some("1"));
        scope.reload().unwrap();
        assert_eq!(scope.get_raw("A", "x").as_deref(), Some("2"));
    }

    #[test]
    fn test_read_only_store() {
        let scope = ConfigScope::with_store(
            ".env",
            Box::new(EnvStore::from_entries([("PORT", "9000")])),
            ScopeOptions::default(),
        );
        assert!(!scope.ensure_option("App", "HOST", "localhost").unwrap());
        assert_eq!(scope.get_raw("App", "PORT").as_deref(), Some("9000"));

        let err = scope.set_raw("App", "PORT", "1").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Store(StoreError::ReadOnly { .. })
        ));
    }

    #[test]
    fn test_with_store_does_not_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.ini");
        std::fs::write(&path, "[A]\nx = 1\n").unwrap();

        let scope = ConfigScope::with_store(&path, Box::new(IniStore::new()), ScopeOptions::default());
        assert!(!scope.has_option("A", "x"));
        scope.reload().unwrap();
        assert!(scope.has_option("A", "x"));
        assert!(scope.is_backed_by(&path));
    }
}
