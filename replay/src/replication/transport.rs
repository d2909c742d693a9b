use std::collections::VecDeque;
use std::future::Future;
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, info};

use crate::error::{ErrorKind, ReplayError, ReplayResult};
use crate::replay_error;
use crate::types::Event;

/// Source of decoded binlog events.
///
/// Waiting for the next event is the only suspension point of the stream driver.
/// Implementations must be cancel safe: dropping a pending [`Transport::next_event`] future
/// must not lose an event.
pub trait Transport {
    /// Returns the next event, or `None` once the source is exhausted.
    ///
    /// Failures are reported as [`ErrorKind::SourceConnectionFailed`],
    /// [`ErrorKind::SourceIoError`] or [`ErrorKind::DeserializationError`].
    fn next_event(&mut self) -> impl Future<Output = ReplayResult<Option<Event>>> + Send;
}

/// Reads pre-decoded events, one JSON document per line.
///
/// Blank lines and lines starting with `#` are ignored. Events that begin before the start
/// position are skipped until the first event at or after it, positions of later binlog files
/// are not filtered.
#[derive(Debug)]
pub struct JsonLinesTransport<R> {
    lines: Lines<R>,
    start_position: u64,
    skipping: bool,
    line_number: u64,
}

impl<R> JsonLinesTransport<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R, start_position: u64) -> Self {
        Self {
            lines: reader.lines(),
            start_position,
            skipping: true,
            line_number: 0,
        }
    }
}

impl JsonLinesTransport<BufReader<File>> {
    /// Opens a file of captured events.
    pub async fn open(path: &Path, start_position: u64) -> ReplayResult<Self> {
        let file = File::open(path).await.map_err(|err| {
            replay_error!(
                ErrorKind::SourceConnectionFailed,
                "Failed to open the event source",
                format!("{}: {err}", path.display()),
                source: err
            )
        })?;

        info!(path = %path.display(), start_position, "reading events from file");

        Ok(Self::new(BufReader::new(file), start_position))
    }
}

impl JsonLinesTransport<BufReader<Stdin>> {
    /// Reads events from standard input.
    pub fn stdin(start_position: u64) -> Self {
        info!(start_position, "reading events from standard input");

        Self::new(BufReader::new(tokio::io::stdin()), start_position)
    }
}

impl<R> Transport for JsonLinesTransport<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_event(&mut self) -> ReplayResult<Option<Event>> {
        loop {
            let line = self.lines.next_line().await.map_err(|err| {
                replay_error!(
                    ErrorKind::SourceIoError,
                    "Failed to read from the event source",
                    err.to_string(),
                    source: err
                )
            })?;

            let Some(line) = line else {
                return Ok(None);
            };
            self.line_number += 1;

            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let event: Event = serde_json::from_str(line).map_err(|err| {
                replay_error!(
                    ErrorKind::DeserializationError,
                    "Failed to decode event",
                    format!("line {}: {err}", self.line_number),
                    source: err
                )
            })?;

            if self.skipping && event.header.start_position() < self.start_position {
                debug!(
                    line = self.line_number,
                    next_position = event.header.next_position,
                    "skipping event before start position"
                );
                continue;
            }
            self.skipping = false;

            return Ok(Some(event));
        }
    }
}

/// Transport serving events from memory.
///
/// Errors can be queued between events to simulate a failing source. With
/// [`MemoryTransport::hold_open`] an exhausted transport waits forever instead of reporting the
/// end of the stream, like a live connection with no new events.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    items: VecDeque<ReplayResult<Event>>,
    hold_open: bool,
}

impl MemoryTransport {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            items: events.into_iter().map(Ok).collect(),
            hold_open: false,
        }
    }

    /// Keeps the transport pending once every queued item was served.
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    pub fn push_event(&mut self, event: Event) {
        self.items.push_back(Ok(event));
    }

    pub fn push_error(&mut self, err: ReplayError) {
        self.items.push_back(Err(err));
    }

    /// Number of items not served yet.
    pub fn remaining(&self) -> usize {
        self.items.len()
    }
}

impl Transport for MemoryTransport {
    async fn next_event(&mut self) -> ReplayResult<Option<Event>> {
        match self.items.pop_front() {
            Some(item) => item.map(Some),
            None if self.hold_open => std::future::pending().await,
            None => Ok(None),
        }
    }
}
