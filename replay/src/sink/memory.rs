use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::error::ReplayResult;
use crate::sink::{Diagnostic, Output, Sink};

/// In-memory sink for tests and development.
///
/// [`MemorySink`] keeps every output in order. Clones share the same storage, so a clone can be
/// handed to the pipeline while the original is inspected afterwards.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    outputs: Arc<Mutex<Vec<Output>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every output written so far.
    pub fn outputs(&self) -> Vec<Output> {
        self.lock().clone()
    }

    /// Returns the text of every statement written so far.
    pub fn statements(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|output| match output {
                Output::Statement(statement) => Some(statement.text.clone()),
                Output::Diagnostic(_) => None,
            })
            .collect()
    }

    /// Returns every diagnostic written so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.lock()
            .iter()
            .filter_map(|output| match output {
                Output::Diagnostic(diagnostic) => Some(diagnostic.clone()),
                Output::Statement(_) => None,
            })
            .collect()
    }

    /// Returns every output rendered as a line, as [`crate::sink::stdout::StdoutSink`] would.
    pub fn lines(&self) -> Vec<String> {
        self.lock().iter().map(ToString::to_string).collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    // A panic while holding the lock cannot leave the vector half-written, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, Vec<Output>> {
        self.outputs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Sink for MemorySink {
    fn name() -> &'static str {
        "memory"
    }

    fn write_output(&self, output: Output) -> ReplayResult<()> {
        debug!(%output, "writing output to memory");
        self.lock().push(output);

        Ok(())
    }
}
