//! Log subscriber installation.
//!
//! Logs go to stderr so stdout stays free for state output. `RUST_LOG`
//! overrides the default filter.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
fn default_filter(debug: bool) -> &'static str {
    if debug {
        "gitops_provider=debug"
    } else {
        "gitops_provider=info"
    }
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(debug: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(debug)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_raises_default_level() {
        assert_eq!(default_filter(false), "gitops_provider=info");
        assert_eq!(default_filter(true), "gitops_provider=debug");
    }

    #[test]
    fn test_default_filters_parse() {
        for debug in [false, true] {
            assert!(EnvFilter::try_new(default_filter(debug)).is_ok());
        }
    }
}
