//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// Logs go to stderr so stdout stays machine readable. `RUST_LOG` wins over
/// `default_level`.
pub fn init(json: bool, default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // A subscriber may already be installed (tests); keep the existing one
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
