//! Tracing setup for the CLI

use tracing_subscriber::EnvFilter;

use crate::cli::GlobalOpts;

/// Install the stderr subscriber
///
/// `TBOM_LOG` overrides the level picked from `--verbose`/`--quiet`,
/// e.g. `TBOM_LOG=tbom::core::catalog=trace`.
pub fn init_tracing(global: &GlobalOpts) {
    let default = if global.verbose {
        "tbom=debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env("TBOM_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    // A second init (tests driving several commands) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(global.verbose)
        .with_writer(std::io::stderr)
        .try_init();
}
