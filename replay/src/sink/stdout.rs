use std::io::{self, Write};

use crate::error::{ErrorKind, ReplayResult};
use crate::replay_error;
use crate::sink::{Output, Sink};

/// Writes each output as one line on standard output.
///
/// Logs go to standard error, so standard output carries only statements and diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl StdoutSink {
    pub fn new() -> Self {
        Self
    }
}

impl Sink for StdoutSink {
    fn name() -> &'static str {
        "stdout"
    }

    fn write_output(&self, output: Output) -> ReplayResult<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{output}")
            .and_then(|()| stdout.flush())
            .map_err(|err| {
                replay_error!(
                    ErrorKind::SinkError,
                    "Failed to write output",
                    err.to_string(),
                    source: err
                )
            })
    }
}
