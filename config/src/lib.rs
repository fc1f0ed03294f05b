//! # Configuration Binding
//!
//! Binds typed converters to options of a configuration file.
//!
//! This crate provides:
//! - `ConfigScope`: shared handle to one backing store and its file
//! - `Setting`: a converter bound to `section.key`, with change hooks
//! - `DynamicSetting`: the same over a converter chosen at runtime
//! - Hot reload of a scope when its file changes on disk

pub mod hot_reload;
pub mod scope;
pub mod setting;

pub use hot_reload::{ScopeReloadEvent, watch_scope};
pub use scope::{ConfigScope, ScopeOptions};
pub use setting::{ChangeHook, ChangeOrigin, DynamicSetting, Setting};
