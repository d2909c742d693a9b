use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;
use std::io;

use replay::error::{ErrorKind, ReplayError};
use telemetry::tracing::TracingError;

/// Result type for listener operations.
pub type ListenerResult<T> = Result<T, ListenerError>;

/// Why the listener stopped before the stream ended on its own.
#[derive(Debug)]
pub enum ListenerError {
    /// Configuration files, environment overrides or command line values are unusable.
    Config(Box<dyn Error + Send + Sync>),
    /// The global log subscriber could not be installed.
    Logging(TracingError),
    /// The async runtime could not be started.
    Runtime(io::Error),
    /// The event stream failed while it was being replayed.
    Stream(ReplayError),
}

impl ListenerError {
    /// Creates a configuration error from any error type.
    pub fn config<E: Error + Send + Sync + 'static>(err: E) -> Self {
        ListenerError::Config(Box::new(err))
    }

    /// Returns a short category label for this error.
    pub fn category(&self) -> &'static str {
        match self {
            ListenerError::Config(_) => "configuration error",
            ListenerError::Logging(_) => "logging setup error",
            ListenerError::Runtime(_) => "runtime error",
            ListenerError::Stream(err) => match err.kind() {
                ErrorKind::SourceConnectionFailed => "source unavailable",
                ErrorKind::SourceIoError => "source read error",
                ErrorKind::DeserializationError => "malformed event",
                _ => "stream error",
            },
        }
    }

    /// Returns what the operator can check to get past this error, if anything.
    fn hint(&self) -> Option<&'static str> {
        match self {
            ListenerError::Config(_) => Some(
                "check the files in the configuration directory, APP_ENVIRONMENT and APP__* overrides",
            ),
            ListenerError::Logging(TracingError::Filter(_)) => Some("check the RUST_LOG filter"),
            ListenerError::Logging(_) | ListenerError::Runtime(_) => None,
            ListenerError::Stream(err) => match err.kind() {
                ErrorKind::SourceConnectionFailed => {
                    Some("check --source or source.path in the configuration")
                }
                ErrorKind::DeserializationError => {
                    Some("each line must hold one JSON encoded event, restart with --start-position to skip it")
                }
                _ => None,
            },
        }
    }

    /// Returns the captured backtrace, only stream errors carry one.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self {
            ListenerError::Stream(err) => Some(err.backtrace()),
            _ => None,
        }
    }

    /// Returns a user-oriented report for terminal output.
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        out.push_str("listener failed\n");
        out.push_str(&format!("category: {}\n", self.category()));
        out.push_str(&format!("error: {self}\n"));
        if let Some(hint) = self.hint() {
            out.push_str(&format!("hint: {hint}\n"));
        }

        if let ListenerError::Stream(err) = self {
            let location = err.location();
            out.push_str(&format!(
                "raised at: {}:{}\n",
                location.file(),
                location.line()
            ));
        }

        let mut source = Error::source(self);
        let mut idx = 1usize;
        while let Some(err) = source {
            out.push_str(&format!("cause {idx}: {err}\n"));
            source = err.source();
            idx += 1;
        }

        if should_render_backtrace()
            && let Some(backtrace) = self.backtrace()
        {
            out.push_str("backtrace:\n");
            out.push_str(&backtrace.to_string());
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }

        out
    }
}

/// Returns whether terminal output should include backtraces.
fn should_render_backtrace() -> bool {
    matches!(
        std::env::var("RUST_BACKTRACE").as_deref(),
        Ok("1") | Ok("full")
    )
}

impl fmt::Display for ListenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerError::Config(source) => write!(f, "{source}"),
            ListenerError::Logging(source) => write!(f, "{source}"),
            ListenerError::Runtime(source) => write!(f, "failed to start the runtime: {source}"),
            // The full display of a replay error carries its backtrace, the report adds it
            // separately when asked to.
            ListenerError::Stream(err) => f.write_str(&err.summary()),
        }
    }
}

impl Error for ListenerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ListenerError::Config(source) => source.source(),
            ListenerError::Logging(source) => source.source(),
            ListenerError::Runtime(_) => None,
            ListenerError::Stream(err) => err.source(),
        }
    }
}

impl From<io::Error> for ListenerError {
    fn from(err: io::Error) -> Self {
        ListenerError::Runtime(err)
    }
}

impl From<TracingError> for ListenerError {
    fn from(err: TracingError) -> Self {
        ListenerError::Logging(err)
    }
}

impl From<ReplayError> for ListenerError {
    fn from(err: ReplayError) -> Self {
        ListenerError::Stream(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::shared::{DriverConfig, ValidationError};
    use replay::replay_error;

    #[test]
    fn test_configuration_report_has_a_hint() {
        let invalid = DriverConfig {
            termination_markers: vec![" ".to_string()],
        };
        let err = ListenerError::config(invalid.validate().unwrap_err());
        let report = err.render_report();

        assert_eq!(err.category(), "configuration error");
        assert!(report.starts_with("listener failed\ncategory: configuration error\n"));
        assert!(report.contains(&format!(
            "error: {}\n",
            ValidationError::BlankTerminationMarker
        )));
        assert!(report.contains("hint: check the files in the configuration directory"));
        assert!(!report.contains("raised at: "));
    }

    #[test]
    fn test_unavailable_source_points_at_the_source_option() {
        let io = io::Error::new(io::ErrorKind::NotFound, "No such file or directory");
        let err = ListenerError::from(replay_error!(
            ErrorKind::SourceConnectionFailed,
            "Failed to open the event source",
            "/var/lib/events.jsonl: No such file or directory",
            source: io
        ));
        let report = err.render_report();

        assert_eq!(err.category(), "source unavailable");
        assert!(report.contains(
            "error: Failed to open the event source: /var/lib/events.jsonl: No such file or directory\n"
        ));
        assert!(report.contains("hint: check --source or source.path in the configuration\n"));
        assert!(report.contains("raised at: ") && report.contains("error.rs:"));
        assert!(report.contains("cause 1: No such file or directory\n"));
    }

    #[test]
    fn test_stream_errors_are_categorized_by_kind() {
        let read = ListenerError::from(replay_error!(
            ErrorKind::SourceIoError,
            "Failed to read from the event source"
        ));
        assert_eq!(read.category(), "source read error");
        assert!(!read.render_report().contains("hint: "));

        let decode = ListenerError::from(replay_error!(
            ErrorKind::DeserializationError,
            "Failed to decode event",
            "line 10: expected value"
        ));
        assert_eq!(decode.category(), "malformed event");
        assert!(decode.render_report().contains("--start-position"));

        let sink = ListenerError::from(replay_error!(ErrorKind::SinkError, "Failed to write output"));
        assert_eq!(sink.category(), "stream error");
    }

    #[test]
    fn test_runtime_errors_have_no_hint() {
        let err = ListenerError::from(io::Error::other("too many open files"));
        assert_eq!(err.category(), "runtime error");
        assert_eq!(
            err.to_string(),
            "failed to start the runtime: too many open files"
        );
        assert!(!err.render_report().contains("hint: "));
    }
}
