use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `build_telemetry=debug`.
pub const LOG_ENV: &str = "BUILD_TELEMETRY_LOG";

/// Logs go to stderr so reports printed on stdout stay clean.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
