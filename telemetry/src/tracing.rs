use std::io;
use std::sync::Once;

use config::environment::Environment;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::{FromEnvError, LevelFilter};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable enabling log output in tests.
const ENABLE_TEST_TRACING_ENV_NAME: &str = "ENABLE_TRACING";

static INIT_TEST_TRACING: Once = Once::new();

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to determine the runtime environment: {0}")]
    Environment(#[from] io::Error),

    #[error("invalid log filter in `RUST_LOG`: {0}")]
    Filter(#[from] FromEnvError),

    #[error("failed to install the global tracing subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Flushes buffered log lines when dropped.
///
/// Keep it alive until the process exits, otherwise the last lines may be lost.
#[must_use]
pub struct LogFlusher {
    _guard: WorkerGuard,
}

/// Installs the global subscriber for a binary.
///
/// Logs are written to stderr through a non-blocking writer so that standard output only
/// carries replayed statements. Production renders one JSON object per line, development
/// renders human readable lines. `RUST_LOG` overrides the default `info` level.
pub fn init_tracing(app_name: &str) -> Result<LogFlusher, TracingError> {
    let environment = Environment::load()?;
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env()?;
    let (writer, guard) = tracing_appender::non_blocking(io::stderr());

    if environment.is_prod() {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(writer),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_ansi(false).with_writer(writer))
            .try_init()?;
    }

    ::tracing::info!(app = app_name, %environment, "tracing initialized");

    Ok(LogFlusher { _guard: guard })
}

/// Installs a test subscriber once per process when `ENABLE_TRACING` is set.
///
/// Output goes through the test writer, so it is captured per test like `println!`.
pub fn init_test_tracing() {
    if std::env::var_os(ENABLE_TEST_TRACING_ENV_NAME).is_none() {
        return;
    }

    INIT_TEST_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_test_writer())
            .try_init();
    });
}
