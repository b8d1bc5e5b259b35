//! Tracing setup.
//!
//! Logs go to stderr so table dumps on stdout stay machine-readable.
//! The filter is taken from `AFFORD_LOG`, then `RUST_LOG`, then `default_directive`.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_ENV: &str = "AFFORD_LOG";

/// Filter directive for a `-v` count.
pub fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Build the filter without installing anything.
pub fn build_filter(default_directive: &str) -> EnvFilter {
    std::env::var(LOG_ENV)
        .ok()
        .or_else(|| std::env::var("RUST_LOG").ok())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(default_directive: &str) {
    let _ = tracing_subscriber::registry()
        .with(build_filter(default_directive))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(default_directive(0), "warn");
        assert_eq!(default_directive(1), "info");
        assert_eq!(default_directive(2), "debug");
        assert_eq!(default_directive(9), "debug");
    }

    #[test]
    fn init_twice_is_harmless() {
        init("off");
        init("debug");
    }
}
