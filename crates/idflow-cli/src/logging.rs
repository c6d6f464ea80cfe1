//! Tracing subscriber setup. Logs go to stderr so stdout stays machine-readable.

use tracing_subscriber::EnvFilter;

pub fn init(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // a global subscriber may already be installed
    if json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}
