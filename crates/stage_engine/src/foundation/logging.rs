//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system from `RUST_LOG`, defaulting to `info`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init() {
    init_with_filter("info");
}

/// Initialize the logging system with a default filter string.
///
/// `RUST_LOG` still wins when it is set.
pub fn init_with_filter(filter: &str) {
    let env = env_logger::Env::default().default_filter_or(filter);
    // A logger may already be installed (tests, embedding applications)
    let _ = env_logger::Builder::from_env(env).try_init();
}
