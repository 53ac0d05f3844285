//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "SHEETCHAT_LOG";

static INIT: Once = Once::new();

/// Installs the global subscriber.
///
/// Reads `SHEETCHAT_LOG` (e.g. `SHEETCHAT_LOG=sheetchat_core=debug`) and falls
/// back to `warn`. Output goes to stderr so stdout carries only the
/// transcript. Calling it more than once is a no-op.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .with(filter)
            .init();
    });
}
