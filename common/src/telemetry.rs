//! Tracing setup shared by both binaries, following the teacher's `main.rs`
//! (`FmtSubscriber::builder().with_max_level(...)`), upgraded to an
//! env-filter subscriber so log verbosity is configurable without a rebuild.

use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber. Safe to call once per process;
/// call at the top of `main()` before anything else logs.
pub fn init(service_name: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    tracing::info!(service = service_name, "telemetry initialized");
}
