use std::sync::Once;
use tracing::Level;

static INIT: Once = Once::new();

/// Installs the global fmt subscriber once; later calls are no-ops.
pub fn init_logging(verbose: bool) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .init();
    });
}
