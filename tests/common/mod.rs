//! Shared test helpers.

use std::sync::Once;

static INIT: Once = Once::new();

/// Install the test tracing subscriber once per process; respects RUST_LOG.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
