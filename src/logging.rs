//! Tracing subscriber setup for the command-line tool.

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Default level for a number of `-v` flags.
pub fn level_for_verbosity(verbose: u8) -> Level {
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Build the filter: `RUST_LOG` wins, otherwise the crate logs at the verbosity level.
pub fn build_filter(verbose: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,section_distance={}",
            level_for_verbosity(verbose).as_str().to_lowercase()
        ))
    })
}

/// Install the global subscriber, writing to stderr. Later calls are no-ops.
pub fn init_logging(verbose: u8) {
    INIT.call_once(|| {
        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_target(verbose > 0)
            .with_writer(std::io::stderr)
            .with_filter(build_filter(verbose));

        // Another subscriber may already be installed (e.g. by an embedding program).
        let _ = tracing_subscriber::registry().with(stderr_layer).try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels() {
        assert_eq!(level_for_verbosity(0), Level::INFO);
        assert_eq!(level_for_verbosity(1), Level::DEBUG);
        assert_eq!(level_for_verbosity(5), Level::TRACE);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(0);
        init_logging(2);
    }
}
