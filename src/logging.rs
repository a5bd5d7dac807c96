use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global fmt subscriber.
///
/// The filter comes from `RUST_LOG` (for example `RUST_LOG=timeline_engine=debug`)
/// and defaults to `info`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// Debug-level subscriber writing through the test harness. Safe to call from every test.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
