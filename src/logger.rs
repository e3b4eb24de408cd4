pub use tracing::{debug, error, info, warn, trace, instrument};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt::{self, format::FmtSpan}};

/// Filter used when `RUST_LOG` is unset: stage and run milestones only.
const DEFAULT_FILTER: &str = "info";

pub fn init() {
    init_with(DEFAULT_FILTER);
}

/// Installs the global subscriber, honoring `RUST_LOG` over `default_filter`.
///
/// With debug or trace output enabled, targets are shown and every span
/// close is printed with its busy/idle time, which is how per-stage capture
/// and resampling timings show up.
pub fn init_with(default_filter: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    let verbose = is_verbose(&env_filter);

    let fmt_layer = fmt::layer()
        .with_target(verbose)
        .with_timer(fmt::time::uptime())
        .with_span_events(if verbose {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        });

    // A second init (tests, embedding apps) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

fn is_verbose(filter: &EnvFilter) -> bool {
    let directives = filter.to_string();
    directives.contains("debug") || directives.contains("trace")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_follows_directives() {
        assert!(!is_verbose(&EnvFilter::new("info")));
        assert!(is_verbose(&EnvFilter::new("warn,spectrocam_rs=debug")));
        assert!(is_verbose(&EnvFilter::new("trace")));
    }

    #[test]
    fn test_repeated_init_is_harmless() {
        init_with("warn");
        init();
        info!("still logging");
    }
}
