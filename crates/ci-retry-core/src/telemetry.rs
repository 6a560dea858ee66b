//! Tracing initialisation for ci-retry binaries.
//!
//! Call [`init_tracing`] once from `main` before any command runs. It
//! installs a global subscriber with an `EnvFilter` and either the plain
//! or the JSON formatter.
//!
//! Every layer writes to stderr. Stdout carries the lines CI consumes
//! (`::error` annotations, the failure summary, the retry announcement)
//! and must not be interleaved with diagnostics.
//!
//! The global subscriber can be set only once per process; later calls
//! are ignored, so tests may call this freely.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the global tracing subscriber.
///
/// * `json`: emit newline-delimited JSON records instead of plain text.
/// * `level`: verbosity used when `RUST_LOG` is unset or invalid.
///
/// `RUST_LOG` directives (e.g. `ci_retry_xcode=debug`) take precedence
/// over `level`.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}
