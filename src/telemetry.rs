use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

/// Installs the global `fmt` subscriber on stderr. `RUST_LOG` wins over
/// `default_filter`. Calling it twice is a no-op.
pub fn init(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}
