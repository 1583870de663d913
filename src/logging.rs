//! Diagnostics of the command line tools, written to stderr.
use tracing_subscriber::EnvFilter;

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

/// Install the `tracing` subscriber of a binary.
///
/// `RUST_LOG` wins over `verbose`, which otherwise selects `debug` instead of `warn`.
/// A second call keeps the subscriber already installed.
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
