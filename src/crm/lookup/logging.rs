use tracing_subscriber::EnvFilter;

use crate::crm::lookup::error::{LookupError, Result};

const DEFAULT_FILTER: &str = "warn";

/// Installs the global tracing subscriber.
///
/// Events go to stderr so that rendered tables on stdout stay clean. The
/// filter honours `RUST_LOG` and falls back to `warn`.
pub fn init() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|error| LookupError::Logging(error.to_string()))
}
