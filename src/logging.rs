use tracing_subscriber::EnvFilter;

/// Sends diagnostics to stderr. `RUST_LOG` overrides the default level.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("calibre_backup=debug")
        } else {
            EnvFilter::new("calibre_backup=info")
        }
    });

    // A second init (e.g. from tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
