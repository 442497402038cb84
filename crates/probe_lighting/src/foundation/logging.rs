//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
///
/// Verbosity is controlled through the `RUST_LOG` environment variable.
pub fn init() {
    env_logger::init();
}

