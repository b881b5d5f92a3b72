// Logging setup for the CLI; library users install their own subscriber
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

const CRATE_TARGET: &str = "fundmatch";

/// Level for this crate's own events and the fallback `RUST_LOG` directive.
/// Quiet runs still show warnings so dropped metrics fetches and rolled back
/// favorites are never silent.
fn default_levels(verbose: bool) -> (LevelFilter, &'static str) {
    if verbose {
        (LevelFilter::DEBUG, "debug")
    } else {
        (LevelFilter::WARN, "warn")
    }
}

/// Installs the global subscriber, writing to stderr so report and table
/// output on stdout stay clean. `RUST_LOG` overrides the fallback directive.
pub fn init_logging(verbose: bool) {
    let (level_filter, directive) = default_levels(verbose);
    let app_filter = Targets::new().with_target(CRATE_TARGET, level_filter);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time().with_writer(std::io::stderr))
        .with(app_filter)
        .with(env_filter)
        .init();
}
