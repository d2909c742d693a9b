use std::fmt;

use crate::error::{ErrorKind, ReplayError, ReplayResult};
use crate::statement::Statement;

/// Category of a diagnostic reported by a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// The server reported an incident.
    Incident,
    /// A rows event referenced a table id with no preceding table map.
    UnresolvedTable,
    /// A value could not be rendered for its column type.
    DataType,
    /// The stream does not have the expected shape.
    ProtocolShape,
    /// Any other failure while replaying a transaction unit.
    TransactionLog,
}

/// A human-readable report of an anomaly found while consuming the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Reports a failure to replay a rows event or one of its rows.
    ///
    /// Unresolved tables name the table id carried in the error detail. Conversion failures are
    /// data type errors, everything else is reported as a transaction log error.
    pub fn from_error(err: &ReplayError) -> Self {
        match err.kind() {
            ErrorKind::ConversionError => Self::new(
                DiagnosticKind::DataType,
                format!("MySQL data type error: {}", err.summary()),
            ),
            ErrorKind::UnresolvedTable => Self::new(
                DiagnosticKind::UnresolvedTable,
                match err.detail() {
                    Some(table_id) => format!(
                        "Table id {table_id} was not registered by any preceding table map event."
                    ),
                    None => format!("{}.", err.description()),
                },
            ),
            ErrorKind::ProtocolShape => Self::new(
                DiagnosticKind::ProtocolShape,
                format!("Transaction log event error: {}", err.summary()),
            ),
            _ => Self::new(
                DiagnosticKind::TransactionLog,
                format!("Transaction log event error: {}", err.summary()),
            ),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Something a handler produced: a reconstructed statement or a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Statement(Statement),
    Diagnostic(Diagnostic),
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Statement(statement) => write!(f, "{statement}"),
            Output::Diagnostic(diagnostic) => write!(f, "{diagnostic}"),
        }
    }
}

impl From<Statement> for Output {
    fn from(statement: Statement) -> Self {
        Output::Statement(statement)
    }
}

impl From<Diagnostic> for Output {
    fn from(diagnostic: Diagnostic) -> Self {
        Output::Diagnostic(diagnostic)
    }
}

/// Receiver of pipeline outputs.
///
/// Handlers call [`Sink::write_output`] once per statement or diagnostic, in stream order. A
/// failing write is logged by the handler and does not stop the stream.
pub trait Sink {
    /// Returns the name of the sink.
    fn name() -> &'static str;

    /// Writes one output.
    fn write_output(&self, output: Output) -> ReplayResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay_error;

    #[test]
    fn test_unresolved_table_message() {
        let err = replay_error!(
            ErrorKind::UnresolvedTable,
            "Table id was not registered by any preceding table map event",
            42
        );
        let diagnostic = Diagnostic::from_error(&err);
        assert_eq!(diagnostic.kind, DiagnosticKind::UnresolvedTable);
        assert_eq!(
            diagnostic.to_string(),
            "Table id 42 was not registered by any preceding table map event."
        );
    }

    #[test]
    fn test_error_diagnostics_are_classified() {
        let err = replay_error!(ErrorKind::ConversionError, "Cell does not match column type");
        let diagnostic = Diagnostic::from_error(&err);
        assert_eq!(diagnostic.kind, DiagnosticKind::DataType);
        assert_eq!(
            diagnostic.message,
            "MySQL data type error: Cell does not match column type"
        );

        let err = replay_error!(ErrorKind::SinkError, "Sink rejected output");
        let diagnostic = Diagnostic::from_error(&err);
        assert_eq!(diagnostic.kind, DiagnosticKind::TransactionLog);
        assert_eq!(
            diagnostic.message,
            "Transaction log event error: Sink rejected output"
        );
    }
}
