use tracing_subscriber::EnvFilter;

/// Log filter variable; defaults to `warn` so stdout stays machine-readable.
const LOG_ENV: &str = "RBILL_LOG";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
