//! Tracing setup for the binary
//!
//! Logs go to stderr so stdout stays clean for `--json` output.
//! `RUST_LOG` replaces the built-in filter entirely.

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str =
    "folio_core=info,folio_agents=info,folio_pipeline=info,folio_ingest=info,folio_render=info,folio_cli=info,folio=info";

/// Filter used with `--verbose`
pub const VERBOSE_LOG_FILTER: &str =
    "folio_core=debug,folio_agents=debug,folio_pipeline=debug,folio_ingest=debug,folio_render=debug,folio_cli=debug,folio=debug";

/// Filter directives for the requested verbosity
#[must_use]
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    }
}

/// Install the global subscriber
///
/// # Errors
/// Fails when a global subscriber is already installed.
pub fn init_logging(verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(filter),
        )
        .try_init()
        .context("installing tracing subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_parse() {
        for directives in [DEFAULT_LOG_FILTER, VERBOSE_LOG_FILTER] {
            assert!(EnvFilter::try_new(directives).is_ok());
        }
    }

    #[test]
    fn verbose_switches_to_debug() {
        assert!(default_filter(true).contains("folio_pipeline=debug"));
        assert!(default_filter(false).contains("folio_pipeline=info"));
    }
}
