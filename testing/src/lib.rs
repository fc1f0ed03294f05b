//! Shared test fixtures for the workspace.
//!
//! Provides temporary configuration files in every supported format and a
//! one-time tracing setup for tests that want to see log output.

mod fixtures;

pub use fixtures::*;
use std::sync::Once;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);
static TRACING: Once = Once::new();

pub fn unique_id(prefix: &str) -> String {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}", prefix, id)
}

/// Install a test writer subscriber filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs it.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_test_writer())
            .with(EnvFilter::from_default_env())
            .try_init();
    });
}
