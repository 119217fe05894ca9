#![allow(dead_code)]

use std::time::Duration;

use tracing_subscriber::EnvFilter;

/// Installs a test subscriber honouring `RUST_LOG`. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Resolves to `value` after `ms` milliseconds on the tokio timer.
///
/// Every call returns the same future type, so results can share a `Vec`.
pub fn after<T>(ms: u64, value: T) -> impl Future<Output = T> {
    async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        value
    }
}
