//! Logging configuration using tracing
//!
//! Structured logging to stderr with support for the RUST_LOG environment variable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber
///
/// Sets up structured logging with:
/// - Filtering via RUST_LOG environment variable (defaults to "warn" so
///   progress output stays readable)
/// - Formatted output to stderr
///
/// # Example RUST_LOG values
/// - `RUST_LOG=info` - Log every repository and contributors fetch
/// - `RUST_LOG=contributors=debug` - Include per-snapshot aggregation details
/// - `RUST_LOG=contributors::strategy=trace` - Trace task scheduling
///
/// # Errors
/// Returns an error if the subscriber has already been initialized
pub fn init() -> crate::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // Thread IDs make interleaving of concurrent fetches visible
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .try_init()
        .map_err(|e| {
            crate::ContributorsError::Other(format!("Failed to initialize tracing: {}", e))
        })?;

    Ok(())
}

/// Initialize logging for tests (no-op if already initialized)
pub fn init_test() {
    let _ = init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_helper() {
        // Should never panic
        init_test();
        init_test();
    }

    #[test]
    fn test_logging_macros() {
        init_test();

        tracing::debug!("This is a debug message");
        tracing::info!(org = "kotlin", repos = 3, "Loaded repositories");
    }
}
