//! Error types and result definitions for binlog replay.
//!
//! Every fallible operation in the crate returns a [`ReplayResult`]. A [`ReplayError`] carries an
//! [`ErrorKind`], a static description, an optional dynamic detail and the callsite where it was
//! raised. Handlers turn the kind into a diagnostic category, the listener turns it into an exit
//! report.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::panic::Location;
use std::sync::Arc;

/// Convenient result type for replay operations using [`ReplayError`] as the error type.
pub type ReplayResult<T> = Result<T, ReplayError>;

/// Detailed payload stored for [`ReplayError`] instances.
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Main error type for replay operations.
#[derive(Debug, Clone)]
pub struct ReplayError {
    payload: Box<ErrorPayload>,
}

/// Categories of failures raised while consuming a change stream.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Source errors
    /// The event source could not be opened.
    SourceConnectionFailed,
    /// Reading from an open event source failed.
    SourceIoError,
    /// A line of the event source is not a valid event.
    DeserializationError,

    // Stream shape errors
    /// A rows event references a table id with no preceding table map in its unit.
    UnresolvedTable,
    /// The stream violates the binlog protocol, for example an odd number of update images.
    ProtocolShape,

    // Data errors
    /// A cell could not be rendered as text for its declared column type.
    ConversionError,

    // Sink errors
    SinkError,
}

impl ReplayError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        self.payload.kind
    }

    /// Returns the static description of this error.
    pub fn description(&self) -> &str {
        &self.payload.description
    }

    /// Returns the detailed error information if available.
    pub fn detail(&self) -> Option<&str> {
        self.payload.detail.as_deref()
    }

    /// Returns a single line made of the description and, when present, the detail.
    pub fn summary(&self) -> String {
        match self.detail() {
            Some(detail) => format!("{}: {detail}", self.description()),
            None => self.description().to_string(),
        }
    }

    /// Returns the captured backtrace for this error.
    pub fn backtrace(&self) -> &Backtrace {
        &self.payload.backtrace
    }

    /// Returns the captured callsite location for this error.
    pub fn location(&self) -> &'static Location<'static> {
        self.payload.location
    }

    /// Attaches an originating [`error::Error`] to this error and returns the modified instance.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        self.payload.source = Some(Arc::new(source));
        self
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
    ) -> Self {
        ReplayError {
            payload: Box::new(ErrorPayload {
                kind,
                description,
                detail,
                source: None,
                location: Location::caller(),
                backtrace: Arc::new(Backtrace::capture()),
            }),
        }
    }
}

impl PartialEq for ReplayError {
    fn eq(&self, other: &ReplayError) -> bool {
        self.payload.kind == other.payload.kind
    }
}

impl Hash for ReplayError {
    /// Hashes only the kind and static description so repeated failures group together.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.payload.kind.hash(state);
        self.payload.description.hash(state);
    }
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        let payload = &self.payload;
        let location = payload.location;
        write!(
            f,
            "[{:?}] {} @ {}:{}:{}",
            payload.kind,
            payload.description,
            location.file(),
            location.line(),
            location.column()
        )?;

        write_detail(payload.detail.as_deref(), f, 1)?;
        write_backtrace(payload.backtrace.as_ref(), f, 1)?;

        Ok(())
    }
}

impl error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.payload
            .source
            .as_ref()
            .map(|source| source as &(dyn error::Error + 'static))
    }
}

fn write_backtrace(
    backtrace: &Backtrace,
    f: &mut fmt::Formatter<'_>,
    indent: usize,
) -> fmt::Result {
    let indent_str = "  ".repeat(indent);

    let rendered_backtrace = format!("{backtrace}");
    if !rendered_backtrace.trim().is_empty() {
        write!(f, "\n{indent_str}Backtrace:")?;
        for line in rendered_backtrace.lines() {
            if line.trim().is_empty() {
                write!(f, "\n{indent_str}  ")?;
            } else {
                write!(f, "\n{indent_str}  {line}")?;
            }
        }
    }

    Ok(())
}

fn write_detail(detail: Option<&str>, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
    let Some(detail) = detail else {
        return Ok(());
    };

    let indent_str = "  ".repeat(indent);
    if detail.trim().is_empty() {
        return write!(f, "\n{indent_str}Detail: <empty>");
    }

    write!(f, "\n{indent_str}Detail:")?;
    for line in detail.lines() {
        if line.trim().is_empty() {
            write!(f, "\n{indent_str}  ")?;
        } else {
            write!(f, "\n{indent_str}  {line}")?;
        }
    }

    Ok(())
}

/// Creates a [`ReplayError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for ReplayError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> ReplayError {
        ReplayError::from_components(kind, Cow::Borrowed(desc), None)
    }
}

/// Creates a [`ReplayError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for ReplayError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> ReplayError {
        ReplayError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bail, replay_error};

    fn failing(table_id: u64) -> ReplayResult<()> {
        bail!(
            ErrorKind::UnresolvedTable,
            "Table id was not registered",
            format!("table id {table_id}")
        );
    }

    #[test]
    fn test_summary_joins_description_and_detail() {
        let err = failing(17).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnresolvedTable);
        assert_eq!(err.summary(), "Table id was not registered: table id 17");

        let err = replay_error!(ErrorKind::ConversionError, "Cell does not match column type");
        assert_eq!(err.summary(), "Cell does not match column type");
    }

    #[test]
    fn test_source_is_kept() {
        let io = std::io::Error::other("connection reset");
        let err = replay_error!(
            ErrorKind::SourceIoError,
            "Failed to read from the event source",
            source: io
        );

        assert_eq!(err.kind(), ErrorKind::SourceIoError);
        let source = error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "connection reset");
    }

    #[test]
    fn test_display_contains_location_and_detail() {
        let err = replay_error!(
            ErrorKind::DeserializationError,
            "Failed to decode event",
            "line 3: missing header"
        );
        let rendered = err.to_string();
        assert!(rendered.starts_with("[DeserializationError] Failed to decode event @ "));
        assert!(rendered.contains("Detail:\n    line 3: missing header"));
    }
}
