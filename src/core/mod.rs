//! Core infrastructure shared by every other module.
//!
//! - [`types`]: index aliases, the training-algorithm tag and adversary policies
//! - [`constants`]: parameter defaults
//! - [`error`]: the crate error type
//! - [`traits`]: the seam between the boosting engine and split search

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

pub use constants::*;
pub use error::{LeakageError, Result};
pub use traits::*;
pub use types::*;

use std::sync::Once;

static LOGGING_INIT: Once = Once::new();

/// Initialise the `env_logger` backend once per process.
///
/// `RUST_LOG` wins when set; otherwise the filter defaults to `info`.
pub fn initialize_logging() {
    LOGGING_INIT.call_once(|| {
        let env = env_logger::Env::default().default_filter_or("info");
        // Another logger may already be installed by the host application.
        let _ = env_logger::Builder::from_env(env).try_init();
        log::debug!("vfl-leakage {} logging initialised", VFL_LEAKAGE_VERSION);
    });
}

/// Check whether [`initialize_logging`] already ran.
pub fn is_logging_initialized() -> bool {
    LOGGING_INIT.is_completed()
}
